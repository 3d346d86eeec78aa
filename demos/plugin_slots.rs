use sovran_typearray::{ArrayConfig, TypeArray};
use std::collections::BTreeMap;

/// Extension data owned by the metrics plugin
#[derive(Debug, Default)]
struct RequestCounts(BTreeMap<&'static str, u64>);

/// Extension data owned by the auth plugin
#[derive(Debug)]
struct Session {
    user: String,
    expires_in: u32,
}

/// Extension data owned by the tracing plugin
#[derive(Debug, Default)]
struct TraceId(u128);

trait Plugin {
    fn name(&self) -> &'static str;
    fn install(&self, slots: &mut TypeArray);
    fn on_request(&self, slots: &mut TypeArray, path: &'static str);
}

struct Metrics;
struct Auth;
struct Tracing;

impl Plugin for Metrics {
    fn name(&self) -> &'static str {
        "metrics"
    }

    fn install(&self, slots: &mut TypeArray) {
        slots.insert(RequestCounts::default());
    }

    fn on_request(&self, slots: &mut TypeArray, path: &'static str) {
        *slots.get_mut::<RequestCounts>().0.entry(path).or_insert(0) += 1;
    }
}

impl Plugin for Auth {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn install(&self, slots: &mut TypeArray) {
        // Space only; a session exists once someone logs in.
        slots.reserve::<Session>();
    }

    fn on_request(&self, slots: &mut TypeArray, path: &'static str) {
        match path {
            "/login" => {
                slots.assign(Session {
                    user: "alice".to_string(),
                    expires_in: 3600,
                });
            }
            "/logout" => {
                if slots.contains::<Session>() {
                    slots.destruct::<Session>();
                }
            }
            _ => {
                if let Some(session) = slots.has_mut::<Session>() {
                    session.expires_in -= 60;
                }
            }
        }
    }
}

impl Plugin for Tracing {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn install(&self, slots: &mut TypeArray) {
        slots.insert(TraceId::default());
    }

    fn on_request(&self, slots: &mut TypeArray, _path: &'static str) {
        slots.get_mut::<TraceId>().0 += 1;
    }
}

/// Demonstrates plugins keeping private data in a shared TypeArray
fn main() {
    let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(Metrics), Box::new(Auth), Box::new(Tracing)];

    // Size the arena for the plugins up front so installing them never moves it
    let config = ArrayConfig::new().with_bytes(256).with_types(plugins.len());
    let mut slots = TypeArray::with_config(config);

    for plugin in &plugins {
        plugin.install(&mut slots);
        println!("installed {}", plugin.name());
    }

    for path in ["/", "/login", "/profile", "/profile", "/logout", "/"] {
        for plugin in &plugins {
            plugin.on_request(&mut slots, path);
        }
        let session = slots
            .has::<Session>()
            .map(|s| format!("{} ({}s left)", s.user, s.expires_in))
            .unwrap_or_else(|| "none".to_string());
        println!("{:<10} trace={} session={}", path, slots.get::<TraceId>().0, session);
    }

    println!("request counts: {:?}", slots.get::<RequestCounts>().0);
    println!(
        "{} live values, {} reserved slots",
        slots.len(),
        slots.reserved_len()
    );

    // Tear everything down, running each plugin's destructors
    slots.clear();
    println!("after clear: {} live values", slots.len());
}
