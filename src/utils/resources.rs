//! Memory and cpu requirements of container components.
//!
//! Containers carry their resources as four optional quantity strings
//! (`memoryLimit`, `memoryRequest`, `cpuLimit`, `cpuRequest`). This module
//! lifts them into [`ResourceRequirements`] so contributions can be summed,
//! and writes the totals back afterwards.
//!
//! Only memory and cpu are modelled. Other resource kinds have no summing
//! rule and are left to the generic override merge.

use super::quantity::Quantity;
use crate::core::Result;
use crate::models::ContainerComponent;
use std::collections::BTreeMap;
use std::fmt;

/// Resource kinds that take part in accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceName {
    Memory,
    Cpu,
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Cpu => write!(f, "cpu"),
        }
    }
}

/// Quantities keyed by resource kind.
pub type ResourceList = BTreeMap<ResourceName, Quantity>;

/// Limits and requests for one container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRequirements {
    pub limits: ResourceList,
    pub requests: ResourceList,
}

impl ResourceRequirements {
    /// Parse the memory/cpu fields of a container. Empty strings count as unset.
    pub fn from_container(container: &ContainerComponent) -> Result<Self> {
        let mut resources = Self::default();
        insert_parsed(&mut resources.limits, ResourceName::Memory, container.memory_limit.as_deref())?;
        insert_parsed(&mut resources.limits, ResourceName::Cpu, container.cpu_limit.as_deref())?;
        insert_parsed(&mut resources.requests, ResourceName::Memory, container.memory_request.as_deref())?;
        insert_parsed(&mut resources.requests, ResourceName::Cpu, container.cpu_request.as_deref())?;
        Ok(resources)
    }

    /// Build requirements from optional quantity strings, as found in configuration.
    pub fn from_strings(
        memory_limit: Option<&str>,
        cpu_limit: Option<&str>,
        memory_request: Option<&str>,
        cpu_request: Option<&str>,
    ) -> Result<Self> {
        let mut resources = Self::default();
        insert_parsed(&mut resources.limits, ResourceName::Memory, memory_limit)?;
        insert_parsed(&mut resources.limits, ResourceName::Cpu, cpu_limit)?;
        insert_parsed(&mut resources.requests, ResourceName::Memory, memory_request)?;
        insert_parsed(&mut resources.requests, ResourceName::Cpu, cpu_request)?;
        Ok(resources)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.limits.is_empty() && self.requests.is_empty()
    }

    /// Fill in every limit and request missing from `self` with the value from `defaults`.
    pub fn apply_defaults(&mut self, defaults: &ResourceRequirements) {
        for (name, quantity) in &defaults.limits {
            self.limits.entry(*name).or_insert(*quantity);
        }
        for (name, quantity) in &defaults.requests {
            self.requests.entry(*name).or_insert(*quantity);
        }
    }

    /// Add `other` onto `self`, only for resource kinds `self` already has.
    pub fn add(&mut self, other: &ResourceRequirements) {
        for (name, quantity) in &other.limits {
            if let Some(total) = self.limits.get_mut(name) {
                total.add(quantity);
            }
        }
        for (name, quantity) in &other.requests {
            if let Some(total) = self.requests.get_mut(name) {
                total.add(quantity);
            }
        }
    }

    /// Write every non-zero value back onto `container`.
    pub fn apply_to_container(&self, container: &mut ContainerComponent) {
        let value = |list: &ResourceList, name| list.get(&name).filter(|q| !q.is_zero()).map(ToString::to_string);

        if let Some(v) = value(&self.limits, ResourceName::Memory) {
            container.memory_limit = Some(v);
        }
        if let Some(v) = value(&self.limits, ResourceName::Cpu) {
            container.cpu_limit = Some(v);
        }
        if let Some(v) = value(&self.requests, ResourceName::Memory) {
            container.memory_request = Some(v);
        }
        if let Some(v) = value(&self.requests, ResourceName::Cpu) {
            container.cpu_request = Some(v);
        }
    }
}

fn insert_parsed(list: &mut ResourceList, name: ResourceName, value: Option<&str>) -> Result<()> {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        list.insert(name, Quantity::parse(value)?);
    }
    Ok(())
}
