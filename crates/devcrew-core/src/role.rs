use serde::{Deserialize, Serialize};
use std::fmt;

/// The four fixed team roles, in pipeline order.
///
/// The declaration order is load-bearing: it is the order milestones flow
/// through the team, and the derived `Ord` keeps per-role maps in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "CEO")]
    Ceo,
    #[serde(rename = "CTO")]
    Cto,
    #[serde(rename = "Coder")]
    Coder,
    #[serde(rename = "Tester")]
    Tester,
}

impl Role {
    /// All roles in pipeline order: CEO → CTO → Coder → Tester.
    pub const ALL: [Role; 4] = [Role::Ceo, Role::Cto, Role::Coder, Role::Tester];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Ceo => "CEO",
            Role::Cto => "CTO",
            Role::Coder => "Coder",
            Role::Tester => "Tester",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s.to_ascii_lowercase().as_str() {
            "ceo" => Some(Role::Ceo),
            "cto" => Some(Role::Cto),
            "coder" => Some(Role::Coder),
            "tester" => Some(Role::Tester),
            _ => None,
        }
    }

    /// The system prompt establishing this role's charter.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Role::Ceo => {
                "You are the CEO of a software company. Your role is to:\n\
                 - Understand and maintain project vision and business goals\n\
                 - Track project progress and alignment with objectives\n\
                 - Document key decisions and rationale\n\
                 - Ensure continuous value delivery"
            }
            Role::Cto => {
                "You are the CTO of a software company. Your role is to:\n\
                 - Maintain technical vision and architecture\n\
                 - Track technical debt and architectural decisions\n\
                 - Document technical learnings and improvements\n\
                 - Ensure technical excellence and innovation"
            }
            Role::Coder => {
                "You are the Senior Software Engineer. Your role is to:\n\
                 - Maintain code quality and implementation standards\n\
                 - Track technical challenges and solutions\n\
                 - Document code decisions and improvements\n\
                 - Ensure maintainable and efficient code"
            }
            Role::Tester => {
                "You are the Quality Assurance Lead. Your role is to:\n\
                 - Maintain test strategies and quality metrics\n\
                 - Track test coverage and technical debt\n\
                 - Document testing insights and improvements\n\
                 - Ensure consistent quality standards"
            }
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
