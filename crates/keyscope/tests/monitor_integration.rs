//! Integration tests for the keyscope monitor and platform backend selection.
//!
//! The monitor tests run on every platform with a scripted console; the
//! backend tests check the build-selected `PlatformConsole`.

use keyscope::application::monitor::{run_monitor, MonitorOptions, OutputFormat, ReadMode};
use keyscope_core::{source::mock::ScriptedSource, KeyScope, ModifierState};

#[test]
fn test_monitor_json_combine_over_scripted_session() {
    // Arrange: Ctrl down, Ctrl+C (char 0x03), Left arrow (enhanced, no char)
    let mut source = ScriptedSource::new();
    source
        .push_key_down(0x11, 0, ModifierState::LEFT_CTRL_PRESSED)
        .push_key_down(0x43, 0x0003, ModifierState::LEFT_CTRL_PRESSED)
        .push_key_up(0x43, 0x0003, ModifierState::LEFT_CTRL_PRESSED)
        .push_key_down(0x25, 0, ModifierState::ENHANCED_KEY);
    let mut scope = KeyScope::new(source);
    scope.init().expect("init");
    let options = MonitorOptions {
        mode: ReadMode::Combine,
        format: OutputFormat::Json,
        max_events: Some(2),
    };
    let mut out = Vec::new();

    // Act
    let printed = run_monitor(&mut scope, &options, &mut out).expect("monitor");

    // Assert
    assert_eq!(printed, 2);
    let lines: Vec<serde_json::Value> = String::from_utf8(out)
        .expect("utf-8")
        .lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["virtual_key_code"], 0x43);
    assert_eq!(lines[0]["state"]["left_ctrl_pressed"], true);
    assert_eq!(lines[1]["virtual_key_code"], 0x25);
    assert_eq!(lines[1]["state"]["enhanced_key"], true);
}

#[cfg(not(target_os = "windows"))]
mod unsupported_backend {
    use keyscope::application::monitor::{run_monitor, MonitorError, MonitorOptions};
    use keyscope::infrastructure::console::{open_key_scope, PlatformConsole};
    use keyscope::infrastructure::storage::config::ConsoleConfig;
    use keyscope_core::{KeyScope, KeyScopeError};

    #[test]
    fn test_open_key_scope_fails_with_unsupported_platform() {
        let result = open_key_scope(&ConsoleConfig::default());
        assert!(matches!(result, Err(KeyScopeError::UnsupportedPlatform(_))));
    }

    #[test]
    fn test_monitor_fails_immediately_without_output() {
        let mut scope = KeyScope::new(PlatformConsole::new(&ConsoleConfig::default()));
        let mut out = Vec::new();

        let result = run_monitor(&mut scope, &MonitorOptions::default(), &mut out);

        assert!(matches!(
            result,
            Err(MonitorError::KeyScope(KeyScopeError::UnsupportedPlatform(_)))
        ));
        assert!(out.is_empty());
    }
}
