use crate::cloudstack::types::{Network, ServiceOffering, Template, VirtualMachine};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineSummary {
    pub name: String,
    pub id: String,
    pub ipaddress: String,
    pub zonename: String,
    pub offering: String,
}

impl MachineSummary {
    /// True if any displayed field equals `term` exactly.
    pub fn matches(&self, term: &str) -> bool {
        [
            &self.name,
            &self.id,
            &self.ipaddress,
            &self.zonename,
            &self.offering,
        ]
        .iter()
        .any(|field| field.as_str() == term)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub name: String,
    pub cidr: String,
    pub id: String,
    pub zoneid: String,
    pub zonename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateSummary {
    pub name: String,
    pub displaytext: String,
    pub ostypename: String,
    pub id: String,
    pub zoneid: String,
    pub zonename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferingSummary {
    pub name: String,
    pub displaytext: String,
    pub id: String,
}

pub fn convert_machine(vm: &VirtualMachine) -> MachineSummary {
    MachineSummary {
        name: vm.displayname.clone(),
        id: vm.id.clone(),
        ipaddress: vm.primary_ip().unwrap_or_default().to_string(),
        zonename: vm.zonename.clone(),
        offering: vm.serviceofferingname.clone(),
    }
}

pub fn convert_network(network: &Network) -> NetworkSummary {
    NetworkSummary {
        name: network.name.clone(),
        cidr: network.cidr.clone().unwrap_or_default(),
        id: network.id.clone(),
        zoneid: network.zoneid.clone(),
        zonename: network.zonename.clone(),
    }
}

pub fn convert_template(template: &Template) -> TemplateSummary {
    TemplateSummary {
        name: template.name.clone(),
        displaytext: template.displaytext.clone(),
        ostypename: template.ostypename.clone(),
        id: template.id.clone(),
        zoneid: template.zoneid.clone().unwrap_or_default(),
        zonename: template.zonename.clone().unwrap_or_default(),
    }
}

pub fn convert_offering(offering: &ServiceOffering) -> OfferingSummary {
    OfferingSummary {
        name: offering.name.clone(),
        displaytext: offering.displaytext.clone(),
        id: offering.id.clone(),
    }
}

/// Anything filterable by a case-insensitive name fragment.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for NetworkSummary {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for TemplateSummary {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for OfferingSummary {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Keep items whose name contains `needle`, ignoring case.
pub fn filter_by_name<T: Named>(items: Vec<T>, needle: &str) -> Vec<T> {
    let needle = needle.to_lowercase();
    items
        .into_iter()
        .filter(|item| item.name().to_lowercase().contains(&needle))
        .collect()
}

/// Machines matching `term` on any field; all machines when `term` is None.
pub fn search_machines(machines: Vec<MachineSummary>, term: Option<&str>) -> Vec<MachineSummary> {
    match term {
        Some(term) => machines.into_iter().filter(|m| m.matches(term)).collect(),
        None => machines,
    }
}

/// Inputs for one `deployVirtualMachine` argument line.
#[derive(Debug, Clone, Default)]
pub struct DeploymentSpec<'a> {
    pub project_id: &'a str,
    pub display_name: &'a str,
    pub template_id: &'a str,
    pub service_offering_id: &'a str,
    pub disk_offering_id: Option<&'a str>,
    pub disk_size: Option<&'a str>,
}

/// `<zone> projectid=.. displayname=.. networkids=.. templateid=.. serviceofferingid=.. zoneid=..`
pub fn deployment_line(network: &NetworkSummary, spec: &DeploymentSpec<'_>) -> String {
    let mut line = format!(
        "{} projectid={} displayname={} networkids={} templateid={} serviceofferingid={} zoneid={}",
        network.zonename,
        spec.project_id,
        spec.display_name,
        network.id,
        spec.template_id,
        spec.service_offering_id,
        network.zoneid
    );
    if let Some(disk_offering_id) = spec.disk_offering_id {
        line.push_str(&format!(" diskofferingid={}", disk_offering_id));
    }
    if let Some(size) = spec.disk_size {
        line.push_str(&format!(" size={}", size));
    }
    line
}
