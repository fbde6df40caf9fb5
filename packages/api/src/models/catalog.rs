//! # Albums, images and tabular page data
//!
//! [`Album`] and [`Image`] mirror the `album` and `image` tables. [`Table`] is
//! what a page hands to the templating side: a header plus rows, each row
//! keeping the id of the record it was built from so links can be generated.

use serde::{Deserialize, Serialize};

use super::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
    pub album_id: i64,
}

/// One table row and the id of the record behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub id: i64,
    pub cells: Vec<String>,
}

/// Header plus rows, ready for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn users(users: &[User]) -> Self {
        Self {
            header: vec!["name".into(), "username".into()],
            rows: users
                .iter()
                .map(|u| Row {
                    id: u.id,
                    cells: vec![u.name.clone(), u.username.clone()],
                })
                .collect(),
        }
    }

    pub fn albums(albums: &[Album]) -> Self {
        Self {
            header: vec!["album".into()],
            rows: albums
                .iter()
                .map(|a| Row {
                    id: a.id,
                    cells: vec![a.name.clone()],
                })
                .collect(),
        }
    }

    pub fn images(images: &[Image]) -> Self {
        Self {
            header: vec!["image".into()],
            rows: images
                .iter()
                .map(|i| Row {
                    id: i.id,
                    cells: vec![i.name.clone()],
                })
                .collect(),
        }
    }
}
