//! Domain fixtures shared by the integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use view_core::{FieldDescriptor, FieldKind, ScalarKind, TypeSchema, Viewable};

/// Four-field entity: `id` is readable, `price` writable, `name` both,
/// `internal` untagged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub price: i64,
    pub internal: String,
}

impl Viewable for Item {
    fn schema() -> TypeSchema {
        TypeSchema::of::<Self>()
            .field(FieldDescriptor::uint("id").groups("read"))
            .field(FieldDescriptor::string("name").groups("read,write"))
            .field(FieldDescriptor::int("price").groups("write"))
            .field(FieldDescriptor::string("internal"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vendor {
    pub name: String,
    pub rating: u8,
    pub iban: String,
}

impl Viewable for Vendor {
    fn schema() -> TypeSchema {
        TypeSchema::of::<Self>()
            .field(FieldDescriptor::string("name").groups("read,write"))
            .field(FieldDescriptor::uint("rating").groups("read"))
            .field(FieldDescriptor::string("iban").groups("billing"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Viewable for Timestamps {
    fn schema() -> TypeSchema {
        TypeSchema::of::<Self>()
            .field(FieldDescriptor::string("created_at").groups("read"))
            .field(FieldDescriptor::string("updated_at").groups("read"))
            .field(
                FieldDescriptor::new(
                    "deleted_at",
                    FieldKind::pointer(FieldKind::Scalar(ScalarKind::String)),
                )
                .groups("admin"),
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Line {
    pub sku: String,
    pub qty: u32,
}

impl Viewable for Line {
    fn schema() -> TypeSchema {
        TypeSchema::of::<Self>()
            .field(FieldDescriptor::string("sku").groups("read,write"))
            .field(FieldDescriptor::uint("qty").groups("read,write"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub id: u64,
    pub status: String,
    pub vendor: Option<Vendor>,
    pub lines: Vec<Line>,
    pub labels: BTreeMap<String, String>,
    pub margin: f64,
    pub token: String,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Viewable for Order {
    fn schema() -> TypeSchema {
        TypeSchema::of::<Self>()
            .field(FieldDescriptor::uint("id").groups("read"))
            .field(FieldDescriptor::string("status").groups("read,write"))
            .field(FieldDescriptor::optional::<Vendor>("vendor").groups("read,write"))
            .field(FieldDescriptor::list("lines", FieldKind::of::<Line>()).groups("read,write"))
            .field(
                FieldDescriptor::map("labels", FieldKind::Scalar(ScalarKind::String))
                    .groups("read,write"),
            )
            .field(FieldDescriptor::float("margin").groups("billing"))
            .field(FieldDescriptor::string("token").private())
            .field(FieldDescriptor::embedded::<Timestamps>())
    }
}

pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
}

pub fn item() -> Item {
    Item {
        id: 1,
        name: "a".into(),
        price: 10,
        internal: "x".into(),
    }
}

pub fn order() -> Order {
    Order {
        id: 42,
        status: "open".into(),
        vendor: Some(Vendor {
            name: "acme".into(),
            rating: 4,
            iban: "DE00 1234".into(),
        }),
        lines: vec![
            Line {
                sku: "bolt".into(),
                qty: 10,
            },
            Line {
                sku: "nut".into(),
                qty: 12,
            },
        ],
        labels: BTreeMap::from([("priority".to_string(), "high".to_string())]),
        margin: 0.25,
        token: "s3cr3t".into(),
        timestamps: Timestamps {
            created_at: at(1),
            updated_at: at(2),
            deleted_at: None,
        },
    }
}
