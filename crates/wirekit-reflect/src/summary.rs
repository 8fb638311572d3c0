//! Serializable listings of descriptors, for introspection and tooling.

use std::fmt;

use serde::Serialize;

use crate::accessor::Category;
use crate::descriptor::TypeDescriptor;

/// A snapshot of a [`TypeDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    pub name: &'static str,
    pub type_name: &'static str,
    pub size: usize,
    pub members: Vec<MemberSummary>,
}

/// One member of a [`TypeSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberSummary {
    pub name: &'static str,
    pub doc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<(i64, i64)>,
    pub offset: usize,
    pub size: usize,
    pub kind: MemberKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Scalar,
    Compound,
    Collection,
}

impl From<Category<'_>> for MemberKind {
    fn from(category: Category<'_>) -> Self {
        match category {
            Category::Scalar => Self::Scalar,
            Category::Compound(_) => Self::Compound,
            Category::Collection(_) => Self::Collection,
        }
    }
}

impl TypeSummary {
    pub(crate) fn of(descriptor: &TypeDescriptor) -> Self {
        let members = descriptor
            .members()
            .iter()
            .map(|member| MemberSummary {
                name: member.name(),
                doc: member.doc().text(),
                range: member.doc().bounds(),
                offset: member.access().offset(),
                size: member.access().size(),
                kind: member.access().category().into(),
            })
            .collect();
        Self {
            name: descriptor.name(),
            type_name: descriptor.type_name(),
            size: descriptor.size(),
            members,
        }
    }

    /// Serializes the summary as pretty-printed JSON.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One line per member:
/// `member: <name> desc: <doc> offset: <o> size: <s>`, followed by
/// ` [compound]` or ` {collection}` where that applies.
impl fmt::Display for TypeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for member in &self.members {
            write!(
                f,
                "member: {} desc: {} offset: {} size: {}",
                member.name, member.doc, member.offset, member.size
            )?;
            match member.kind {
                MemberKind::Scalar => {}
                MemberKind::Compound => write!(f, " [compound]")?,
                MemberKind::Collection => write!(f, " {{collection}}")?,
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
