use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level submission mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GdeType {
    Emissao,
    Submissao,
    Resumo,
}

impl GdeType {
    pub const ALL: &[GdeType] = &[GdeType::Emissao, GdeType::Submissao, GdeType::Resumo];

    pub fn as_str(&self) -> &'static str {
        match self {
            GdeType::Emissao => "emissao",
            GdeType::Submissao => "submissao",
            GdeType::Resumo => "resumo",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GdeType::Emissao => "Emissão",
            GdeType::Submissao => "Submissão",
            GdeType::Resumo => "Resumo",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "emissao" => Some(GdeType::Emissao),
            "submissao" => Some(GdeType::Submissao),
            "resumo" => Some(GdeType::Resumo),
            _ => None,
        }
    }
}

impl fmt::Display for GdeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
