#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageButton {
    pub label: String,
    /// Target page; `None` when the button is disabled.
    pub target: Option<u32>,
    pub active: bool,
    pub numbered: bool,
}

/// Pagination controls for a server-paged list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
}

impl Pagination {
    /// `None` when there is nothing to page through.
    pub fn new(current_page: u32, total_pages: u32) -> Option<Self> {
        (total_pages > 1).then(|| Self {
            current_page: current_page.clamp(1, total_pages),
            total_pages,
        })
    }

    pub fn buttons(&self, previous: &str, next: &str) -> Vec<PageButton> {
        let mut buttons = Vec::with_capacity(self.total_pages as usize + 2);
        buttons.push(PageButton {
            label: previous.to_string(),
            target: (self.current_page > 1).then(|| self.current_page - 1),
            active: false,
            numbered: false,
        });
        for page in 1..=self.total_pages {
            buttons.push(PageButton {
                label: page.to_string(),
                target: Some(page),
                active: page == self.current_page,
                numbered: true,
            });
        }
        buttons.push(PageButton {
            label: next.to_string(),
            target: (self.current_page < self.total_pages).then(|| self.current_page + 1),
            active: false,
            numbered: false,
        });
        buttons
    }

    pub fn render(&self, previous: &str, next: &str) -> String {
        let mut html = String::from(r#"<div class="pagination-controls">"#);
        for button in self.buttons(previous, next) {
            let mut class = String::from("btn-page");
            if button.numbered {
                class.push_str(" page-number");
            }
            if button.active {
                class.push_str(" active");
            }
            match button.target {
                Some(page) => html.push_str(&format!(
                    r#"<button class="{}" data-page="{}">{}</button>"#,
                    class,
                    page,
                    super::html::escape(&button.label)
                )),
                None => html.push_str(&format!(
                    r#"<button class="{}" disabled>{}</button>"#,
                    class,
                    super::html::escape(&button.label)
                )),
            }
        }
        html.push_str("</div>");
        html
    }
}

/// Renders the controls, or an empty string for single-page results.
pub fn render_pagination(current_page: u32, total_pages: u32, previous: &str, next: &str) -> String {
    Pagination::new(current_page, total_pages)
        .map(|p| p.render(previous, next))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_page_renders_nothing() {
        assert_eq!(Pagination::new(1, 1), None);
        assert_eq!(Pagination::new(1, 0), None);
        assert_eq!(render_pagination(1, 1, "Prev", "Next"), "");
    }

    #[test]
    fn first_page_disables_previous_only() {
        let p = Pagination::new(1, 3).unwrap();
        let buttons = p.buttons("Prev", "Next");
        assert_eq!(buttons.len(), 5);
        assert_eq!(buttons[0].target, None);
        assert!(buttons[1].active);
        assert_eq!(buttons[4].target, Some(2));
    }

    #[test]
    fn last_page_disables_next() {
        let html = render_pagination(3, 3, "Prev", "Next");
        assert_eq!(html.matches("page-number").count(), 3);
        assert!(html.contains(r#"<button class="btn-page page-number active" data-page="3">3</button>"#));
        assert!(html.contains(r#"<button class="btn-page" disabled>Next</button>"#));
        assert!(html.contains(r#"<button class="btn-page" data-page="2">Prev</button>"#));
    }
}
