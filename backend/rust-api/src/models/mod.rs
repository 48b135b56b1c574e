use serde::Deserialize;

pub mod execution;
pub mod hint;
pub mod interaction;
pub mod student;

/// Some endpoints accept a single value where others send a list; the
/// frontend has shipped both shapes for `correctAnswers`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StringOrList::One(value) => vec![value],
            StringOrList::Many(values) => values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_or_list_accepts_both_shapes() {
        let one: StringOrList = serde_json::from_str("\"Paris\"").unwrap();
        assert_eq!(one.into_vec(), vec!["Paris".to_string()]);

        let many: StringOrList = serde_json::from_str("[\"a\", \"b\"]").unwrap();
        assert_eq!(many.into_vec(), vec!["a".to_string(), "b".to_string()]);
    }
}
