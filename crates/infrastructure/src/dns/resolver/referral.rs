use hickory_proto::op::Message;
use hickory_proto::rr::{Name, RData, Record};
use rootwalk_domain::DomainError;
use std::net::IpAddr;

/// Result of looking up a nameserver address that the referral did not
/// carry as glue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlueOutcome {
    Resolved(Vec<IpAddr>),
    /// The glue resolver answered but returned no A records.
    NoAddress,
    /// The lookup itself failed; the nameserver is dropped for this step.
    Failed(DomainError),
}

impl GlueOutcome {
    pub fn from_response(response: &Message) -> Self {
        let addresses = ipv4_answers(response.answers());
        if addresses.is_empty() {
            Self::NoAddress
        } else {
            Self::Resolved(addresses)
        }
    }
}

/// Nameservers named by a referral, in authority-section order, each with the
/// addresses known for it so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delegation {
    nameservers: Vec<(Name, Vec<IpAddr>)>,
}

impl Delegation {
    /// Collect NS targets from the authority section and attach any A glue
    /// from the additional section whose owner matches one of them.
    pub fn from_response(response: &Message) -> Self {
        let mut delegation = Self::default();

        for record in response.name_servers() {
            if let Some(RData::NS(ns)) = record.data() {
                if !delegation.contains(&ns.0) {
                    delegation.nameservers.push((ns.0.clone(), Vec::new()));
                }
            }
        }

        for record in response.additionals() {
            if let Some(RData::A(a)) = record.data() {
                delegation.add_address(record.name(), IpAddr::V4(a.0));
            }
        }

        delegation
    }

    pub fn is_empty(&self) -> bool {
        self.nameservers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nameservers.len()
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.nameservers.iter().any(|(ns, _)| ns == name)
    }

    pub fn addresses(&self, name: &Name) -> Option<&[IpAddr]> {
        self.nameservers
            .iter()
            .find(|(ns, _)| ns == name)
            .map(|(_, addrs)| addrs.as_slice())
    }

    /// Nameservers that still have no address.
    pub fn missing_glue(&self) -> Vec<Name> {
        self.nameservers
            .iter()
            .filter(|(_, addrs)| addrs.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn add_address(&mut self, name: &Name, address: IpAddr) {
        if let Some((_, addrs)) = self.nameservers.iter_mut().find(|(ns, _)| ns == name) {
            if !addrs.contains(&address) {
                addrs.push(address);
            }
        }
    }

    pub fn apply_glue(&mut self, name: &Name, outcome: &GlueOutcome) {
        if let GlueOutcome::Resolved(addresses) = outcome {
            for address in addresses {
                self.add_address(name, *address);
            }
        }
    }

    /// Every known nameserver address, deduplicated, in delegation order.
    pub fn servers(&self) -> Vec<IpAddr> {
        let mut servers: Vec<IpAddr> = Vec::new();
        for (_, addrs) in &self.nameservers {
            for address in addrs {
                if !servers.contains(address) {
                    servers.push(*address);
                }
            }
        }
        servers
    }
}

fn ipv4_answers(records: &[Record]) -> Vec<IpAddr> {
    records
        .iter()
        .filter_map(|record| match record.data() {
            Some(RData::A(a)) => Some(IpAddr::V4(a.0)),
            _ => None,
        })
        .collect()
}
