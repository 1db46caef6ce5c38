use serde::{Deserialize, Serialize};

fn first_page() -> u32 {
    1
}

/// Server-driven page of a list endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Paginated<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_items: Option<u64>,
}

/// Some endpoints answer a bare array where others wrap it in a page.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListPayload<T> {
    Plain(Vec<T>),
    Paged(Paginated<T>),
}

impl<T> ListPayload<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListPayload::Plain(items) => items,
            ListPayload::Paged(page) => page.data,
        }
    }

    /// Bare arrays are treated as a single page.
    pub fn into_page(self) -> Paginated<T> {
        match self {
            ListPayload::Plain(items) => Paginated {
                data: items,
                current_page: 1,
                total_pages: 1,
                total_items: None,
            },
            ListPayload::Paged(page) => page,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrollmentRequest {
    pub student_id: i64,
    pub class_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_payload_accepts_both_shapes() {
        let plain: ListPayload<i64> = serde_json::from_str("[1,2]").unwrap();
        assert_eq!(plain.into_page().total_pages, 1);

        let paged: ListPayload<i64> =
            serde_json::from_str(r#"{"data":[3],"current_page":2,"total_pages":4}"#).unwrap();
        let page = paged.into_page();
        assert_eq!((page.data, page.current_page, page.total_pages), (vec![3], 2, 4));
    }
}
