mod common;

use cli::commands::{self, ServiceChanges};
use cli::CliError;
use common::temp_config;
use traymux_core::{config, CoreError, ServiceDefinition};

fn output_of_list(path: &std::path::Path) -> String {
    let mut out = Vec::new();
    commands::list(path, &mut out).expect("list");
    String::from_utf8(out).expect("utf8")
}

#[test]
fn list_creates_missing_file() {
    let (_dir, path) = temp_config();
    let out = output_of_list(&path);
    assert!(out.starts_with("No services configured"), "{out}");
    assert!(path.exists());
}

#[test]
fn add_appends_in_order_and_persists() {
    let (_dir, path) = temp_config();
    commands::add(&path, ServiceDefinition::new("web", "/srv/web", "npm start")).unwrap();
    commands::add(&path, ServiceDefinition::new("db", "", "postgres")).unwrap();

    let file = config::load(&path).unwrap();
    let names: Vec<_> = file.services.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["web", "db"]);

    assert_eq!(
        output_of_list(&path),
        "web\t/srv/web\tnpm start\ndb\t-\tpostgres\n"
    );
}

#[test]
fn add_rejects_duplicates_and_blank_commands() {
    let (_dir, path) = temp_config();
    commands::add(&path, ServiceDefinition::new("web", "", "true")).unwrap();

    let err = commands::add(&path, ServiceDefinition::new("web", "", "false")).unwrap_err();
    assert!(matches!(err, CliError::Core(CoreError::DuplicateService(_))));

    let err = commands::add(&path, ServiceDefinition::new("other", "", " ")).unwrap_err();
    assert!(matches!(err, CliError::Core(CoreError::ValidationError(_))));

    assert_eq!(config::load(&path).unwrap().services.len(), 1);
}

#[test]
fn edit_changes_fields_in_place() {
    let (_dir, path) = temp_config();
    commands::add(&path, ServiceDefinition::new("a", "/a", "one")).unwrap();
    commands::add(&path, ServiceDefinition::new("b", "/b", "two")).unwrap();

    let updated = commands::edit(
        &path,
        "a",
        ServiceChanges {
            name: Some("alpha".to_string()),
            command: Some("uno".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(updated, ServiceDefinition::new("alpha", "/a", "uno"));

    let file = config::load(&path).unwrap();
    assert_eq!(file.services[0], updated);
    assert_eq!(file.services[1].name, "b");
}

#[test]
fn edit_errors() {
    let (_dir, path) = temp_config();
    commands::add(&path, ServiceDefinition::new("a", "", "one")).unwrap();
    commands::add(&path, ServiceDefinition::new("b", "", "two")).unwrap();

    let err = commands::edit(&path, "a", ServiceChanges::default()).unwrap_err();
    assert_eq!(err.code(), "CLI002");

    let rename_onto_b = ServiceChanges {
        name: Some("b".to_string()),
        ..Default::default()
    };
    let err = commands::edit(&path, "a", rename_onto_b).unwrap_err();
    assert!(matches!(err, CliError::Core(CoreError::DuplicateService(_))));

    let err = commands::edit(
        &path,
        "missing",
        ServiceChanges {
            command: Some("x".to_string()),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, CliError::Core(CoreError::ServiceNotFound(_))));
}

#[test]
fn remove_deletes_by_name() {
    let (_dir, path) = temp_config();
    commands::add(&path, ServiceDefinition::new("a", "", "one")).unwrap();
    commands::add(&path, ServiceDefinition::new("b", "", "two")).unwrap();

    let removed = commands::remove(&path, "a").unwrap();
    assert_eq!(removed.name, "a");
    assert_eq!(config::load(&path).unwrap().services.len(), 1);

    let err = commands::remove(&path, "a").unwrap_err();
    assert_eq!(err.code(), "CORE105");
}
