//! Geofence event simulator
//!
//! Publishes transition events to the ingest topic, either one at a time or as a
//! scripted scenario, for local testing against a running geofence-alerts.
//!
//! Usage:
//!   cargo run --bin geofence-sim -- --kind EXIT --region home --lat 37.422 --lon -122.084
//!   cargo run --bin geofence-sim -- --error 2
//!   cargo run --bin geofence-sim -- --scenario all

use clap::Parser;
use geofence_alerts::infra::Config;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde_json::{json, Value};
use std::time::Duration;

// ============================================================================
// CLI Args
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "geofence-sim")]
#[command(about = "Publish simulated geofence transition events")]
struct Args {
    /// Config file path (broker and topic are taken from it)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the ingest topic
    #[arg(long)]
    topic: Option<String>,

    /// Transition kind: ENTER, EXIT, DWELL or a numeric code
    #[arg(long, default_value = "EXIT")]
    kind: String,

    /// Triggered region id (repeat for several)
    #[arg(long, default_value = "home")]
    region: Vec<String>,

    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Publish a monitoring error with this status code instead of a transition
    #[arg(long)]
    error: Option<i32>,

    /// Run a named scenario (or "all") instead of a single event
    #[arg(long)]
    scenario: Option<String>,

    /// Delay between scenario events (ms)
    #[arg(long, default_value = "500")]
    delay_ms: u64,
}

// ============================================================================
// Scenarios
// ============================================================================

struct Scenario {
    name: &'static str,
    description: &'static str,
    payload: fn() -> Value,
}

const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "exit_with_location",
        description: "EXIT home at 37.422, -122.084: all enabled channels fire",
        payload: || {
            json!({
                "kind": "EXIT",
                "regions": ["home"],
                "location": {"latitude": 37.422, "longitude": -122.084}
            })
        },
    },
    Scenario {
        name: "enter_without_location",
        description: "ENTER work, no location: body has no coordinates",
        payload: || json!({"kind": "ENTER", "regions": ["work"]}),
    },
    Scenario {
        name: "dwell",
        description: "DWELL home: no channel fires",
        payload: || json!({"kind": "DWELL", "regions": ["home"]}),
    },
    Scenario {
        name: "too_many_regions",
        description: "Monitoring error 2: logged as too many monitored regions, no alert",
        payload: || json!({"error": 2}),
    },
    Scenario {
        name: "exit_no_region",
        description: "EXIT with empty region list: discarded",
        payload: || json!({"kind": "EXIT", "regions": []}),
    },
    Scenario {
        name: "numeric_kind",
        description: "EXIT given as numeric code 2",
        payload: || json!({"kind": 2, "regions": ["home"]}),
    },
];

fn single_event(args: &Args) -> Value {
    if let Some(code) = args.error {
        return json!({ "error": code });
    }

    let kind: Value = match args.kind.parse::<i64>() {
        Ok(code) => json!(code),
        Err(_) => json!(args.kind.to_uppercase()),
    };
    let mut event = json!({ "kind": kind, "regions": args.region });
    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        event["location"] = json!({ "latitude": lat, "longitude": lon });
    }
    event
}

fn selected_scenarios(name: &str) -> Vec<&'static Scenario> {
    if name == "all" {
        return SCENARIOS.iter().collect();
    }
    SCENARIOS.iter().filter(|s| name.split(',').any(|n| n.trim() == s.name)).collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load_from_path(Config::resolve_config_path(args.config.as_deref()));
    let topic = args.topic.clone().unwrap_or_else(|| config.mqtt_topic().to_string());

    let payloads: Vec<(String, Value)> = match &args.scenario {
        Some(name) => {
            let scenarios = selected_scenarios(name);
            if scenarios.is_empty() {
                eprintln!("Unknown scenario '{}'. Available:", name);
                for s in SCENARIOS {
                    eprintln!("  {:<24} {}", s.name, s.description);
                }
                std::process::exit(2);
            }
            scenarios.iter().map(|s| (s.name.to_string(), (s.payload)())).collect()
        }
        None => vec![("event".to_string(), single_event(&args))],
    };

    let client_id = format!("geofence-sim-{}", std::process::id());
    let mut mqttoptions = MqttOptions::new(client_id, config.mqtt_host(), config.mqtt_port());
    mqttoptions.set_keep_alive(Duration::from_secs(5));
    if let (Some(username), Some(password)) = (config.mqtt_username(), config.mqtt_password()) {
        mqttoptions.set_credentials(username, password);
    }
    let (client, mut eventloop) = AsyncClient::new(mqttoptions, 10);

    let expected_acks = payloads.len();
    let delay = Duration::from_millis(args.delay_ms);
    tokio::spawn(async move {
        for (i, (name, payload)) in payloads.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(delay).await;
            }
            let body = payload.to_string();
            println!("-> {} {} {}", topic, name, body);
            if let Err(e) = client.publish(&topic, QoS::AtLeastOnce, false, body).await {
                eprintln!("publish failed: {}", e);
            }
        }
    });

    // Drive the eventloop until every publish is acknowledged
    let mut acks = 0;
    while acks < expected_acks {
        match tokio::time::timeout(Duration::from_secs(10), eventloop.poll()).await {
            Ok(Ok(Event::Incoming(Packet::PubAck(_)))) => acks += 1,
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                eprintln!("mqtt error: {}", e);
                return Err(e.into());
            }
            Err(_) => {
                eprintln!("timed out waiting for broker acknowledgements ({}/{})", acks, expected_acks);
                break;
            }
        }
    }

    println!("published {}/{} events", acks, expected_acks);
    Ok(())
}
