//! In-memory OPNsense router for store and orchestrator tests.
//!
//! Holds reservation and alias tables keyed by UUID (insertion ordered),
//! answers the same paths as the real API, and records every request so
//! tests can assert on exactly what was sent.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use opnsync_api::{Error, Method, RouterTransport};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct State {
    reservations: IndexMap<String, Value>,
    aliases: IndexMap<String, Value>,
    calls: Vec<Call>,
    failing: Vec<String>,
}

#[derive(Default)]
pub struct FakeRouter {
    state: Mutex<State>,
}

impl FakeRouter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_reservation(&self, mac: &str, ip: &str, hostname: &str, descr: &str) -> String {
        let uuid = uuid::Uuid::new_v4().to_string();
        self.state.lock().unwrap().reservations.insert(
            uuid.clone(),
            json!({
                "mac": mac,
                "ipaddr": ip,
                "hostname": hostname,
                "descr": descr,
                "disabled": "0",
                "interface": "lan",
            }),
        );
        uuid
    }

    pub fn seed_alias(&self, name: &str, alias_type: &str, content: &[&str]) -> String {
        let uuid = uuid::Uuid::new_v4().to_string();
        self.state.lock().unwrap().aliases.insert(
            uuid.clone(),
            json!({
                "name": name,
                "type": alias_type,
                "content": content.join("\n"),
                "description": "",
                "enabled": "1",
            }),
        );
        uuid
    }

    /// Every request whose path starts with `prefix` fails with HTTP 500.
    pub fn fail_on(&self, prefix: &str) {
        self.state.lock().unwrap().failing.push(prefix.to_owned());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Requests that would change router state (add/set/del/reconfigure).
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == Method::Post)
            .collect()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    pub fn reservations(&self) -> Vec<Value> {
        self.state.lock().unwrap().reservations.values().cloned().collect()
    }

    pub fn reservation(&self, uuid: &str) -> Option<Value> {
        self.state.lock().unwrap().reservations.get(uuid).cloned()
    }

    pub fn aliases(&self) -> Vec<Value> {
        self.state.lock().unwrap().aliases.values().cloned().collect()
    }

    fn handle(state: &mut State, method: Method, path: &str, body: Option<&Value>) -> Result<Value, Error> {
        let route = path.split('?').next().unwrap_or(path);
        let (prefix, id) = match route.rsplit_once('/') {
            Some((head, tail)) if tail.len() == 36 => (head, Some(tail)),
            _ => (route, None),
        };

        match (method, prefix, id) {
            (Method::Get, "dhcpv4/leases/searchReservations", None) => {
                Ok(json!({ "reservations": state.reservations }))
            }
            (Method::Get, "dhcpv4/leases/getReservation", Some(id)) => Ok(state
                .reservations
                .get(id)
                .map_or_else(|| json!({}), |r| json!({ "reservation": r }))),
            (Method::Post, "dhcpv4/leases/addReservation", None) => {
                Ok(insert(&mut state.reservations, body, "reservation"))
            }
            (Method::Post, "dhcpv4/leases/setReservation", Some(id)) => {
                Ok(replace(&mut state.reservations, id, body, "reservation"))
            }
            (Method::Post, "dhcpv4/leases/delReservation", Some(id)) => {
                Ok(remove(&mut state.reservations, id))
            }
            (Method::Get, "firewall/alias/searchItem", None) => {
                Ok(json!({ "aliases": state.aliases }))
            }
            (Method::Get, "firewall/alias/getItem", Some(id)) => Ok(state
                .aliases
                .get(id)
                .map_or_else(|| json!({}), |a| json!({ "alias": a }))),
            (Method::Post, "firewall/alias/addItem", None) => {
                Ok(insert(&mut state.aliases, body, "alias"))
            }
            (Method::Post, "firewall/alias/setItem", Some(id)) => {
                Ok(replace(&mut state.aliases, id, body, "alias"))
            }
            (Method::Post, "firewall/alias/delItem", Some(id)) => Ok(remove(&mut state.aliases, id)),
            (Method::Post, "dhcpv4/service/reconfigure" | "firewall/alias/reconfigure", None) => {
                Ok(json!({ "status": "ok", "changed": true }))
            }
            _ => Err(Error::Api {
                status: 404,
                message: format!("no route for {method} {path}"),
                validations: std::collections::BTreeMap::new(),
            }),
        }
    }
}

fn insert(table: &mut IndexMap<String, Value>, body: Option<&Value>, key: &str) -> Value {
    let Some(record) = body.and_then(|b| b.get(key)).cloned() else {
        return json!({ "status": "failed", "message": format!("missing {key}") });
    };
    let uuid = uuid::Uuid::new_v4().to_string();
    table.insert(uuid.clone(), record);
    json!({ "status": "ok", "uuid": uuid })
}

fn replace(table: &mut IndexMap<String, Value>, id: &str, body: Option<&Value>, key: &str) -> Value {
    let Some(record) = body.and_then(|b| b.get(key)).cloned() else {
        return json!({ "status": "failed", "message": format!("missing {key}") });
    };
    match table.get_mut(id) {
        Some(slot) => {
            *slot = record;
            json!({ "status": "ok" })
        }
        None => json!({ "status": "failed", "message": "not found" }),
    }
}

fn remove(table: &mut IndexMap<String, Value>, id: &str) -> Value {
    match table.shift_remove(id) {
        Some(_) => json!({ "status": "ok" }),
        None => json!({ "status": "failed", "message": "not found" }),
    }
}

impl RouterTransport for FakeRouter {
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            method,
            path: path.to_owned(),
            body: body.cloned(),
        });

        if state.failing.iter().any(|p| path.starts_with(p.as_str())) {
            return Err(Error::Api {
                status: 500,
                message: "injected failure".into(),
                validations: std::collections::BTreeMap::new(),
            });
        }

        Self::handle(&mut state, method, path, body)
    }
}

pub fn mac(n: u8) -> String {
    format!("AA:BB:CC:DD:EE:{n:02X}")
}
