//! One pooled store per configured host, provisioned before any work starts.

use crate::error::{LoadTestError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Host-to-store lookup built once at startup.
///
/// `hosts` keeps the configured order (duplicates included) because work
/// units are assigned round-robin over it; each distinct host owns exactly
/// one store.
pub struct Registry<S> {
    hosts: Vec<String>,
    stores: HashMap<String, Arc<S>>,
}

impl<S> Registry<S> {
    /// Open a store for every distinct host using `open`.
    ///
    /// Fails on the first host whose store cannot be created.
    pub fn open<F>(hosts: &[String], mut open: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<S>,
    {
        if hosts.is_empty() {
            return Err(LoadTestError::Config(
                "at least one host is required".to_string(),
            ));
        }

        let mut stores = HashMap::with_capacity(hosts.len());
        for host in hosts {
            if !stores.contains_key(host) {
                stores.insert(host.clone(), Arc::new(open(host)?));
            }
        }

        Ok(Self {
            hosts: hosts.to_vec(),
            stores,
        })
    }

    /// Configured hosts in order.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// The host whose table the final count is read from.
    pub fn first_host(&self) -> &str {
        &self.hosts[0]
    }

    pub fn get(&self, host: &str) -> Result<Arc<S>> {
        self.stores
            .get(host)
            .cloned()
            .ok_or_else(|| LoadTestError::UnknownHost(host.to_string()))
    }

    /// Every distinct store paired with its host name.
    pub fn stores(&self) -> impl Iterator<Item = (&str, &Arc<S>)> {
        self.stores.iter().map(|(h, s)| (h.as_str(), s))
    }

    /// Take the stores back out, e.g. to close their pools.
    pub fn into_stores(self) -> Vec<Arc<S>> {
        self.stores.into_values().collect()
    }
}
