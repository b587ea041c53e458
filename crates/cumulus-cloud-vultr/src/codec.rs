//! Vultr v1 wire codec
//!
//! Everything Vultr-specific about the wire format lives here: endpoint
//! paths, form field names, the status vocabulary, and the decoding of
//! responses into the normalized [`Instance`] model. The driver never sees
//! a raw `SUBID` field or a v1 status string.

use crate::transport::truncated;
use chrono::{DateTime, NaiveDateTime, Utc};
use cumulus_cloud::{CloudError, Instance, InstanceStatus, LifecycleRequest, Result};
use serde::Deserialize;
use std::collections::HashMap;

pub const LIST_PATH: &str = "/v1/server/list";

/// v1 pseudo-OS id meaning "restore from snapshot"
const OSID_SNAPSHOT: &str = "164";

/// Encode a lifecycle request into its v1 endpoint path and form fields.
pub fn encode(request: &LifecycleRequest) -> (&'static str, Vec<(&'static str, String)>) {
    match request {
        LifecycleRequest::Create(spec) => {
            let mut form = vec![
                ("DCID", spec.region.clone()),
                ("VPSPLANID", spec.plan.clone()),
                ("OSID", OSID_SNAPSHOT.to_string()),
                ("SNAPSHOTID", spec.image.clone()),
            ];
            if let Some(name) = &spec.name {
                form.push(("label", name.clone()));
            }
            if !spec.tags.is_empty() {
                form.push(("tag", spec.tags.join(",")));
            }
            ("/v1/server/create", form)
        }
        LifecycleRequest::Delete(id) => ("/v1/server/destroy", subid(id)),
        LifecycleRequest::Start(id) => ("/v1/server/start", subid(id)),
        LifecycleRequest::Stop(id) => ("/v1/server/halt", subid(id)),
    }
}

fn subid(id: &str) -> Vec<(&'static str, String)> {
    vec![("SUBID", id.to_string())]
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(rename = "SUBID")]
    subid: String,
}

/// A server object as the v1 API reports it.
#[derive(Debug, Deserialize)]
struct RawServer {
    #[serde(rename = "SUBID")]
    subid: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    power_status: String,
    #[serde(default)]
    server_state: String,
    #[serde(default)]
    date_created: String,
    #[serde(default)]
    internal_ip: String,
    #[serde(default)]
    main_ip: String,
}

/// Decode a create response into the accepted instance id.
pub fn decode_created(status: u16, body: &str) -> Result<String> {
    let response: CreateResponse =
        serde_json::from_str(body).map_err(|_| decode_error(status, body))?;
    if response.subid.is_empty() {
        return Err(decode_error(status, body));
    }
    Ok(response.subid)
}

/// Decode a single server object (the `list?SUBID=` response).
pub fn decode_server(status: u16, body: &str) -> Result<Instance> {
    let raw: RawServer = serde_json::from_str(body).map_err(|_| decode_error(status, body))?;
    Ok(into_instance(raw))
}

/// Decode the list response: a JSON object keyed by SUBID, or an empty
/// array when the account has no servers. Output order is stable for a
/// single response (sorted by id); nothing more is guaranteed.
pub fn decode_server_list(status: u16, body: &str) -> Result<Vec<Instance>> {
    if body.trim() == "[]" {
        return Ok(Vec::new());
    }
    let map: HashMap<String, RawServer> =
        serde_json::from_str(body).map_err(|_| decode_error(status, body))?;
    let mut instances: Vec<Instance> = map.into_values().map(into_instance).collect();
    instances.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(instances)
}

fn into_instance(raw: RawServer) -> Instance {
    Instance {
        status: map_status(&raw.status, &raw.power_status, &raw.server_state),
        id: raw.subid,
        name: raw.label,
        created_at: parse_created(&raw.date_created),
        private_ip: optional_ip(raw.internal_ip),
        public_ip: optional_ip(raw.main_ip),
    }
}

/// Map the v1 status vocabulary onto the normalized enum.
///
/// `status` is the subscription state; the power and server states refine
/// it. Anything unrecognized maps to `Unknown` so a vocabulary change on
/// the provider side degrades instead of failing the decode.
fn map_status(status: &str, power_status: &str, server_state: &str) -> InstanceStatus {
    match status {
        "pending" => InstanceStatus::Provisioning,
        "active" => match power_status {
            // active subscriptions keep installing for a while
            "running" if server_state == "installingbooting" => InstanceStatus::Provisioning,
            "running" => InstanceStatus::Active,
            "stopped" => InstanceStatus::Stopped,
            _ => InstanceStatus::Unknown,
        },
        "suspended" => InstanceStatus::Error,
        "closed" => InstanceStatus::Deleting,
        _ => InstanceStatus::Unknown,
    }
}

/// The v1 API reports unassigned addresses as "" or "0.0.0.0".
fn optional_ip(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "0.0.0.0" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_created(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn decode_error(status: u16, body: &str) -> CloudError {
    CloudError::Decode {
        status,
        body: truncated(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cumulus_cloud::InstanceSpec;

    const ACTIVE_SERVER: &str = r#"{
        "SUBID": "576965",
        "os": "Custom Installed",
        "label": "worker-1",
        "status": "active",
        "power_status": "running",
        "server_state": "ok",
        "date_created": "2019-06-12 09:18:04",
        "internal_ip": "10.99.0.10",
        "main_ip": "45.76.4.10"
    }"#;

    #[test]
    fn encode_create_uses_v1_field_names() {
        let spec = InstanceSpec::new("snap-42", "201", "1")
            .with_name("worker-1")
            .with_tag("cumulus");
        let (path, form) = encode(&LifecycleRequest::Create(spec));

        assert_eq!(path, "/v1/server/create");
        assert!(form.contains(&("DCID", "1".to_string())));
        assert!(form.contains(&("VPSPLANID", "201".to_string())));
        assert!(form.contains(&("OSID", "164".to_string())));
        assert!(form.contains(&("SNAPSHOTID", "snap-42".to_string())));
        assert!(form.contains(&("label", "worker-1".to_string())));
        assert!(form.contains(&("tag", "cumulus".to_string())));
    }

    #[test]
    fn encode_create_omits_empty_optionals() {
        let spec = InstanceSpec::new("snap-42", "201", "1");
        let (_, form) = encode(&LifecycleRequest::Create(spec));
        assert!(!form.iter().any(|(k, _)| *k == "label" || *k == "tag"));
    }

    #[test]
    fn encode_mutations_carry_the_subid() {
        for (request, path) in [
            (LifecycleRequest::Delete("576965".into()), "/v1/server/destroy"),
            (LifecycleRequest::Start("576965".into()), "/v1/server/start"),
            (LifecycleRequest::Stop("576965".into()), "/v1/server/halt"),
        ] {
            let (got_path, form) = encode(&request);
            assert_eq!(got_path, path);
            assert_eq!(form, vec![("SUBID", "576965".to_string())]);
        }
    }

    #[test]
    fn decode_created_extracts_the_id() {
        assert_eq!(
            decode_created(200, r#"{"SUBID": "576965"}"#).unwrap(),
            "576965"
        );
    }

    #[test]
    fn decode_created_rejects_empty_and_malformed_bodies() {
        for body in ["", "not json", "{}", r#"{"SUBID": ""}"#] {
            match decode_created(200, body) {
                Err(CloudError::Decode { status: 200, .. }) => {}
                other => panic!("expected Decode error for {body:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn decode_server_normalizes_a_running_instance() {
        let instance = decode_server(200, ACTIVE_SERVER).unwrap();
        assert_eq!(instance.id, "576965");
        assert_eq!(instance.name, "worker-1");
        assert_eq!(instance.status, InstanceStatus::Active);
        assert_eq!(instance.private_ip.as_deref(), Some("10.99.0.10"));
        assert_eq!(instance.public_ip.as_deref(), Some("45.76.4.10"));
        assert!(instance.created_at.is_some());
    }

    #[test]
    fn unassigned_ips_decode_to_none() {
        let body = r#"{
            "SUBID": "576966",
            "label": "fresh",
            "status": "pending",
            "power_status": "",
            "server_state": "none",
            "date_created": "2019-06-12 09:18:04",
            "main_ip": "0.0.0.0"
        }"#;
        let instance = decode_server(200, body).unwrap();
        assert_eq!(instance.status, InstanceStatus::Provisioning);
        assert_eq!(instance.private_ip, None);
        assert_eq!(instance.public_ip, None);
    }

    #[test]
    fn unrecognized_status_maps_to_unknown_not_an_error() {
        let body = r#"{"SUBID": "1", "status": "defrosting", "power_status": "warm"}"#;
        let instance = decode_server(200, body).unwrap();
        assert_eq!(instance.status, InstanceStatus::Unknown);
    }

    #[test]
    fn status_vocabulary_mapping() {
        assert_eq!(map_status("pending", "", "none"), InstanceStatus::Provisioning);
        assert_eq!(
            map_status("active", "running", "installingbooting"),
            InstanceStatus::Provisioning
        );
        assert_eq!(map_status("active", "running", "ok"), InstanceStatus::Active);
        assert_eq!(map_status("active", "stopped", "ok"), InstanceStatus::Stopped);
        assert_eq!(map_status("suspended", "running", "ok"), InstanceStatus::Error);
        assert_eq!(map_status("closed", "", ""), InstanceStatus::Deleting);
    }

    #[test]
    fn list_flattens_the_subid_keyed_map() {
        let body = format!(
            r#"{{"576965": {ACTIVE_SERVER}, "100200": {{"SUBID": "100200", "label": "b", "status": "pending"}}}}"#
        );
        let instances = decode_server_list(200, &body).unwrap();
        assert_eq!(instances.len(), 2);
        // stable order within a single response
        assert_eq!(instances[0].id, "100200");
        assert_eq!(instances[1].id, "576965");
    }

    #[test]
    fn empty_list_responses_decode_to_an_empty_vec() {
        assert!(decode_server_list(200, "{}").unwrap().is_empty());
        assert!(decode_server_list(200, "[]").unwrap().is_empty());
    }

    #[test]
    fn malformed_list_body_is_a_decode_error() {
        assert!(matches!(
            decode_server_list(200, "<html>gateway</html>"),
            Err(CloudError::Decode { .. })
        ));
    }

    #[test]
    fn unparseable_timestamps_decode_to_none() {
        let body = r#"{"SUBID": "1", "status": "pending", "date_created": "soon"}"#;
        assert!(decode_server(200, body).unwrap().created_at.is_none());
    }
}
