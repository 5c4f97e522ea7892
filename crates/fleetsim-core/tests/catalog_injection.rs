use fleetsim_core::{FleetSynth, LocationKind, SynthError};
use time::macros::{date, datetime};

const FIXTURE_CATALOGS: &str = r#"{
  "templates": [{ "name": "Prueba de sensor", "instructions": "Registrar lectura." }],
  "tags": ["Pruebas"],
  "assignees": ["qa@example.com"],
  "streets": ["Calle Falsa"],
  "neighborhoods": ["Springfield"],
  "geofences": ["Patio de pruebas"]
}"#;

fn fixture_synth() -> FleetSynth {
    FleetSynth::from_catalog_json(FIXTURE_CATALOGS)
        .unwrap_or_else(|err| panic!("fixture catalogs should load: {err}"))
}

#[test]
fn injected_catalogs_replace_builtin_lists() {
    let synth = fixture_synth();
    for n in 0..50 {
        let event = synth.generate_event(&format!("event-{n}"), date!(2024 - 02 - 29));
        assert_eq!(event.template_name, "Prueba de sensor");
        assert_eq!(event.instructions, "Registrar lectura.");
        assert_eq!(event.tag, "Pruebas");
        assert_eq!(event.assignee_email, "qa@example.com");
    }
}

#[test]
fn injected_catalogs_name_lifecycle_points() {
    let synth = fixture_synth();
    for n in 0..50 {
        let lifecycle = synth.compose_lifecycle(
            &format!("event-{n}"),
            &[],
            datetime!(2024-02-29 12:00:00 UTC),
            None,
        );
        for point in [&lifecycle.start_location, &lifecycle.end_location] {
            match point.name.kind {
                LocationKind::Geofence => assert_eq!(point.name.name, "Patio de pruebas"),
                LocationKind::Address => {
                    assert!(point.name.name.starts_with("Calle Falsa "));
                    assert!(point.name.name.ends_with(", Col. Springfield"));
                }
            }
        }
    }
}

#[test]
fn empty_lists_are_rejected_on_load() {
    let document = FIXTURE_CATALOGS.replace(r#"["Pruebas"]"#, "[]");
    match FleetSynth::from_catalog_json(&document) {
        Err(SynthError::Validation(message)) => {
            assert!(message.contains("at least one entry"), "unexpected message: {message}");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn attributes_are_independent_of_catalog_instance() {
    let first = FleetSynth::default();
    let second = FleetSynth::default();
    let day = date!(2024 - 06 - 01);
    for n in 0..100 {
        let id = format!("event-{n}");
        assert_eq!(first.generate_event(&id, day), second.generate_event(&id, day));
    }
}
