//! The indexed document library and query suggestions.

use chrono::NaiveDate;
use iosrag_core::LibraryDocument;

const SUGGESTIONS: [&str; 8] = [
    "BGP configuration",
    "OSPF troubleshooting",
    "MPLS VPN setup",
    "ASA firewall rules",
    "QoS implementation",
    "EIGRP optimization",
    "VLAN configuration",
    "Spanning tree protocol",
];

struct Entry {
    id: &'static str,
    title: &'static str,
    source: &'static str,
    relevance_score: f64,
    document_type: &'static str,
    certification_level: &'static [&'static str],
    summary: &'static str,
    local_path: &'static str,
    page_references: &'static [u32],
    date_added: (i32, u32, u32),
    software_type: &'static str,
}

const ENTRIES: [Entry; 4] = [
    Entry {
        id: "1",
        title: "BGP Configuration and Troubleshooting Guide - ASR 1000 Series",
        source: "cisco.com",
        relevance_score: 0.97,
        document_type: "troubleshooting",
        certification_level: &["CCNP", "CCIE"],
        summary: "Comprehensive guide covering BGP implementation on ASR 1000 series routers, \
                  including configuration examples, troubleshooting common issues, and best \
                  practices for enterprise deployments.",
        local_path: "/documents/bgp_asr1000_guide.pdf",
        page_references: &[23, 45, 67, 89],
        date_added: (2023, 11, 15),
        software_type: "Cisco IOS",
    },
    Entry {
        id: "2",
        title: "OSPF Design and Implementation Guide",
        source: "ciscopress.com",
        relevance_score: 0.85,
        document_type: "configuration",
        certification_level: &["CCNA", "CCNP"],
        summary: "Detailed guide on OSPF protocol design considerations, implementation \
                  strategies, and optimization techniques for various network topologies.",
        local_path: "/documents/ospf_design_guide.pdf",
        page_references: &[12, 34, 56],
        date_added: (2023, 10, 22),
        software_type: "Cisco IOS",
    },
    Entry {
        id: "3",
        title: "Advanced MPLS Concepts and Configurations",
        source: "ine.com",
        relevance_score: 0.78,
        document_type: "study",
        certification_level: &["CCIE"],
        summary: "In-depth exploration of MPLS technologies including MPLS VPN, Traffic \
                  Engineering, and QoS implementation strategies for service provider networks.",
        local_path: "/documents/advanced_mpls.pdf",
        page_references: &[45, 67, 89, 120],
        date_added: (2023, 9, 5),
        software_type: "Cisco IOS XR",
    },
    Entry {
        id: "4",
        title: "Cisco ASA Firewall Configuration Guide",
        source: "cisco.com",
        relevance_score: 0.92,
        document_type: "configuration",
        certification_level: &["CCNA Security", "CCNP Security"],
        summary: "Complete guide for ASA firewall configuration including security policies, \
                  VPN setup, and advanced threat protection features.",
        local_path: "/documents/asa_firewall_guide.pdf",
        page_references: &[15, 28, 42, 67],
        date_added: (2023, 12, 1),
        software_type: "Cisco ASA",
    },
];

impl Entry {
    fn to_document(&self) -> LibraryDocument {
        let (year, month, day) = self.date_added;
        LibraryDocument {
            id: self.id.to_string(),
            title: self.title.to_string(),
            source: self.source.to_string(),
            relevance_score: self.relevance_score,
            document_type: self.document_type.to_string(),
            certification_level: self
                .certification_level
                .iter()
                .map(ToString::to_string)
                .collect(),
            summary: self.summary.to_string(),
            local_path: self.local_path.to_string(),
            page_references: self.page_references.to_vec(),
            date_added: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
            software_type: self.software_type.to_string(),
        }
    }
}

/// A fresh copy of every library document.
pub fn library_documents() -> Vec<LibraryDocument> {
    ENTRIES.iter().map(Entry::to_document).collect()
}

/// Library document by id.
pub fn find(id: &str) -> Option<LibraryDocument> {
    ENTRIES.iter().find(|e| e.id == id).map(Entry::to_document)
}

/// Suggestions containing `partial` (case-insensitive); the first `limit`
/// suggestions when `partial` is blank.
pub fn suggestions(partial: &str, limit: usize) -> Vec<String> {
    let needle = partial.trim().to_lowercase();
    SUGGESTIONS
        .iter()
        .filter(|s| needle.is_empty() || s.to_lowercase().contains(&needle))
        .take(limit)
        .map(ToString::to_string)
        .collect()
}
