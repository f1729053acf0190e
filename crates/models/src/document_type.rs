use std::fmt;

use serde::{Deserialize, Serialize};

/// PDF documents the backend can render for a sales project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalesProjectPdfDocumentType {
    ApiPdfForm,
    FrameContract,
    #[serde(rename = "FRAME_CONTRACT_1")]
    FrameContract1,
    #[serde(rename = "FRAME_CONTRACT_2")]
    FrameContract2,
    #[serde(rename = "FRAME_CONTRACT_3")]
    FrameContract3,
    IpVpnPdfForm,
    PortalPdfForm,
    RoutingSheet,
}

impl SalesProjectPdfDocumentType {
    pub const ALL: [Self; 8] = [
        Self::ApiPdfForm,
        Self::FrameContract,
        Self::FrameContract1,
        Self::FrameContract2,
        Self::FrameContract3,
        Self::IpVpnPdfForm,
        Self::PortalPdfForm,
        Self::RoutingSheet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiPdfForm => "API_PDF_FORM",
            Self::FrameContract => "FRAME_CONTRACT",
            Self::FrameContract1 => "FRAME_CONTRACT_1",
            Self::FrameContract2 => "FRAME_CONTRACT_2",
            Self::FrameContract3 => "FRAME_CONTRACT_3",
            Self::IpVpnPdfForm => "IP_VPN_PDF_FORM",
            Self::PortalPdfForm => "PORTAL_PDF_FORM",
            Self::RoutingSheet => "ROUTING_SHEET",
        }
    }
}

impl fmt::Display for SalesProjectPdfDocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
