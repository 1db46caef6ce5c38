/// Escapes text for use in element content and quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes and turns newlines into `<br>`.
pub fn multiline(raw: &str) -> String {
    escape(raw).replace('\n', "<br>")
}

/// First `max` characters, with `...` appended when anything was cut.
pub fn truncate_chars(raw: &str, max: usize) -> String {
    match raw.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &raw[..cut]),
        None => raw.to_string(),
    }
}

pub fn or_na(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "N/A",
    }
}

pub fn option(value: &str, label: &str, selected: bool) -> String {
    format!(
        r#"<option value="{}"{}>{}</option>"#,
        escape(value),
        if selected { " selected" } else { "" },
        escape(label)
    )
}

/// `<select>` with a leading "-- placeholder --" entry.
pub fn select(name: &str, placeholder: &str, options: &[(String, String)], selected: &str) -> String {
    let mut html = format!(
        r#"<select name="{}"><option value="">-- {} --</option>"#,
        escape(name),
        escape(placeholder)
    );
    for (value, label) in options {
        html.push_str(&option(value, label, value == selected));
    }
    html.push_str("</select>");
    html
}

pub fn error_paragraph(message: &str) -> String {
    format!(r#"<p style="color:red;">{}</p>"#, escape(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("abcd", 3), "abc...");
        assert_eq!(truncate_chars("សួស្តី", 2), "សួ...");
    }

    #[test]
    fn select_marks_the_chosen_option() {
        let html = select(
            "class_id",
            "Please Select",
            &[("1".into(), "Grade 5".into()), ("2".into(), "Grade 6".into())],
            "2",
        );
        assert!(html.contains(r#"<option value="2" selected>Grade 6</option>"#));
        assert!(html.contains(r#"<option value="1">Grade 5</option>"#));
    }
}
