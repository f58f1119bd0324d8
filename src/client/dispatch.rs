//! Category dispatch
//!
//! A fetched entry is either literal content or a fragment list pointing at
//! chunk entries. The category tag decides; an entry that lost its sidecar
//! has no tag and is treated as literal content.

use crate::fragment::FragmentList;
use crate::store::Category;

use super::api::FetchedMessage;
use super::ClientResult;

/// What a fetched entry turned out to be.
#[derive(Debug)]
pub enum Resolved {
    Literal {
        content: String,
        category: Option<Category>,
    },
    Fragments(FragmentList),
}

/// Route a fetched entry by its category tag.
///
/// Only `file-fragment-list` triggers parsing; nothing is ever dispatched
/// recursively, since chunk keys always denote literal file entries.
pub fn resolve(message: FetchedMessage) -> ClientResult<Resolved> {
    match message.category {
        Some(Category::FragmentList) => {
            let list = FragmentList::parse(&message.content)?;
            Ok(Resolved::Fragments(list))
        }
        category => Ok(Resolved::Literal {
            content: message.content,
            category,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;

    fn fetched(content: &str, category: Option<Category>) -> FetchedMessage {
        FetchedMessage {
            key: "deadbeef".to_string(),
            content: content.to_string(),
            category,
        }
    }

    #[test]
    fn plain_messages_stay_literal() {
        let resolved = resolve(fetched("hola", Some(Category::Message))).unwrap();
        assert!(matches!(
            resolved,
            Resolved::Literal {
                category: Some(Category::Message),
                ..
            }
        ));
    }

    #[test]
    fn missing_category_degrades_to_literal() {
        let resolved = resolve(fetched("orphan", None)).unwrap();
        match resolved {
            Resolved::Literal { content, category } => {
                assert_eq!(content, "orphan");
                assert_eq!(category, None);
            }
            other => panic!("expected literal, got {:?}", other),
        }
    }

    #[test]
    fn fragment_lists_are_parsed() {
        let resolved = resolve(fetched(
            "notes.txt:0a1b2c3d:deadbeef",
            Some(Category::FragmentList),
        ))
        .unwrap();
        match resolved {
            Resolved::Fragments(list) => {
                assert_eq!(list.name(), "notes.txt");
                assert_eq!(list.len(), 2);
            }
            other => panic!("expected fragments, got {:?}", other),
        }
    }

    #[test]
    fn malformed_fragment_lists_fail_validation() {
        let err = resolve(fetched("notes.txt:NOTHEX", Some(Category::FragmentList))).unwrap_err();
        assert!(matches!(err, ClientError::Fragment(_)));
    }
}
