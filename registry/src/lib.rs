//! A deliberately minimal service registry (section 6.1). The
//! specification treats the registry as an out-of-scope collaborator -
//! "a key/value + health store with name -> address lookup" - so this
//! implements exactly that surface and nothing more: no replication, no
//! active health probing, just a heartbeat TTL on each registration.

use std::time::{Duration, Instant};

use actix_web::{web, HttpResponse};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// How long a registration remains healthy without a fresh
/// register/heartbeat call.
pub const HEARTBEAT_TTL: Duration = Duration::from_secs(15);

struct Entry {
    address: String,
    last_seen: Instant,
}

#[derive(Default)]
pub struct Registry {
    entries: DashMap<String, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn register(&self, name: &str, address: &str) {
        self.entries.insert(
            name.to_string(),
            Entry {
                address: address.to_string(),
                last_seen: Instant::now(),
            },
        );
    }

    pub fn deregister(&self, name: &str) {
        self.entries.remove(name);
    }

    pub fn lookup(&self, name: &str) -> Option<String> {
        self.entries.get(name).map(|e| e.address.clone())
    }

    /// Healthy iff registered and the last heartbeat is within
    /// `HEARTBEAT_TTL`. An entry that has never been re-registered within
    /// the TTL is treated the same as `unavailable` by callers - this
    /// registry does not remove stale entries on its own, it only reports
    /// them as unhealthy, so a late heartbeat can still recover them.
    pub fn is_healthy(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|e| e.last_seen.elapsed() < HEARTBEAT_TTL)
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct DeregisterRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
}

pub async fn register(
    registry: web::Data<Registry>,
    body: web::Json<RegisterRequest>,
) -> HttpResponse {
    registry.register(&body.name, &body.address);
    HttpResponse::Ok().json(OkResponse { ok: true })
}

pub async fn deregister(
    registry: web::Data<Registry>,
    body: web::Json<DeregisterRequest>,
) -> HttpResponse {
    registry.deregister(&body.name);
    HttpResponse::Ok().json(OkResponse { ok: true })
}

pub async fn lookup(registry: web::Data<Registry>, name: web::Path<String>) -> HttpResponse {
    match registry.lookup(&name) {
        Some(address) => HttpResponse::Ok().json(LookupResponse { address }),
        None => HttpResponse::NotFound().json(OkResponse { ok: false }),
    }
}

pub async fn health(registry: web::Data<Registry>, name: web::Path<String>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        healthy: registry.is_healthy(&name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_lookup_round_trips() {
        let registry = Registry::new();
        registry.register("bank/bank_a", "127.0.0.1:9101");
        assert_eq!(
            registry.lookup("bank/bank_a"),
            Some("127.0.0.1:9101".to_string())
        );
        assert!(registry.is_healthy("bank/bank_a"));
    }

    #[test]
    fn deregister_removes_entry() {
        let registry = Registry::new();
        registry.register("coordinator", "127.0.0.1:9100");
        registry.deregister("coordinator");
        assert_eq!(registry.lookup("coordinator"), None);
        assert!(!registry.is_healthy("coordinator"));
    }

    #[test]
    fn unknown_name_is_unhealthy() {
        let registry = Registry::new();
        assert!(!registry.is_healthy("bank/nonexistent"));
    }
}
