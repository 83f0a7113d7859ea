// (C) 2025 - Enzo Lombardi
// End-to-end command flow: buffer -> parser -> executor against a live
// engine on the mock backend.

use std::time::{Duration, Instant};

use termsplash::command::{CommandBuffer, CommandExecutor, ExecCtx, parse};
use termsplash::config::ConfigStore;
use termsplash::core::theme::ThemeSet;
use termsplash::engine::AnimationEngine;
use termsplash::patterns::PatternRegistry;
use termsplash::terminal::TerminalRenderer;
use termsplash::test_util::MockBackend;

struct Fixture {
    engine: AnimationEngine,
    registry: PatternRegistry,
    themes: ThemeSet,
    executor: CommandExecutor,
    config: Option<ConfigStore>,
}

impl Fixture {
    fn new() -> Self {
        let (backend, _handle) = MockBackend::new(80, 24);
        let renderer = TerminalRenderer::with_backend(Box::new(backend), false).unwrap();
        let registry = PatternRegistry::builtin();
        let themes = ThemeSet::builtin();
        let pattern = registry.build(0, themes.get(0).unwrap()).unwrap();
        Self {
            engine: AnimationEngine::new(renderer, pattern, 30),
            registry,
            themes,
            executor: CommandExecutor::with_seed(0, 0, 1234),
            config: None,
        }
    }

    fn with_config(path: &std::path::Path) -> Self {
        let mut fixture = Self::new();
        fixture.config = Some(ConfigStore::open(path).unwrap());
        fixture
    }

    fn run(&mut self, input: &str) -> termsplash::command::ExecOutcome {
        let cmd = parse(input).unwrap_or_else(|| panic!("parse failed: {}", input));
        let mut ctx = ExecCtx {
            engine: &mut self.engine,
            registry: &self.registry,
            themes: &self.themes,
            config: self.config.as_mut(),
        };
        self.executor.execute(&cmd, &mut ctx)
    }
}

#[test]
fn typing_a_command_and_executing_it() {
    // Activate, type p then 3, press ENTER
    let mut buffer = CommandBuffer::new();
    buffer.activate();
    buffer.add_char('p');
    buffer.add_char('3');
    let raw = buffer.execute();

    assert_eq!(raw, "0p3");
    assert_eq!(buffer.history_len(), 1);
    assert_eq!(buffer.history().next(), Some("0p3"));
    assert!(!buffer.is_active());
    assert_eq!(buffer.text(), "");
    assert_eq!(buffer.cursor(), 0);

    // The executed text drives a real pattern switch
    let mut fixture = Fixture::new();
    let outcome = fixture.run(&raw);
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(fixture.engine.pattern().name(), "starfield");
    assert_eq!(fixture.executor.pattern_index(), 2);
}

#[test]
fn preset_applies_to_active_pattern() {
    let mut fixture = Fixture::new();
    let outcome = fixture.run("03");
    assert!(outcome.success);
    assert!(outcome.message.contains("preset 3"));
    assert!(outcome.message.contains("waves"));

    let failure = fixture.run("042");
    assert!(!failure.success);
}

#[test]
fn pattern_switch_with_preset_suffix() {
    let mut fixture = Fixture::new();
    let outcome = fixture.run("0p3.5");
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(fixture.engine.pattern().name(), "starfield");
    assert!(outcome.message.contains("preset 5"));
}

#[test]
fn pattern_switch_by_partial_name() {
    let mut fixture = Fixture::new();
    let outcome = fixture.run("0pfirew");
    assert!(outcome.success);
    assert_eq!(fixture.engine.pattern().name(), "fireworks");
}

#[test]
fn unknown_pattern_changes_nothing() {
    let mut fixture = Fixture::new();
    let outcome = fixture.run("0pnosuch");
    assert!(!outcome.success);
    assert_eq!(fixture.engine.pattern().name(), "waves");
    assert_eq!(fixture.executor.pattern_index(), 0);
}

#[test]
fn theme_switch_rebuilds_active_pattern() {
    let mut fixture = Fixture::new();
    let outcome = fixture.run("0tfire");
    assert!(outcome.success);
    assert_eq!(fixture.executor.theme_index(), 1);
    // Pattern survives the rebuild
    assert_eq!(fixture.engine.pattern().name(), "waves");
}

#[test]
fn combination_runs_in_order_and_aggregates() {
    let mut fixture = Fixture::new();
    let outcome = fixture.run("0pwaves+tfire");
    assert!(outcome.success, "{}", outcome.message);
    assert!(outcome.message.contains('|'));
    assert_eq!(fixture.executor.theme_index(), 1);

    let mixed = fixture.run("0p2+pnosuch");
    assert!(!mixed.success);
    assert!(mixed.message.contains('✗'));
    // The valid part still ran
    assert_eq!(fixture.engine.pattern().name(), "rain");
}

#[test]
fn favorites_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let mut fixture = Fixture::with_config(&path);

    // Save current state into slot 3, then wander off and load it back
    let saved = fixture.run("0F3");
    assert!(saved.success, "{}", saved.message);

    fixture.run("0p4+t3");
    assert_eq!(fixture.engine.pattern().name(), "fireworks");

    let loaded = fixture.run("0f3");
    assert!(loaded.success, "{}", loaded.message);
    assert_eq!(fixture.engine.pattern().name(), "waves");
    assert_eq!(fixture.executor.theme_index(), 0);
}

#[test]
fn favorite_failures_are_explicit() {
    let mut no_config = Fixture::new();
    assert!(!no_config.run("0f1").success);
    assert!(!no_config.run("0F1").success);

    let dir = tempfile::tempdir().unwrap();
    let mut fixture = Fixture::with_config(&dir.path().join("config.json"));
    let outcome = fixture.run("0f9");
    assert!(!outcome.success);
    assert!(outcome.message.contains("empty"));
}

#[test]
fn shuffle_enables_and_fires_on_interval() {
    let mut fixture = Fixture::new();
    let outcome = fixture.run("0!30");
    assert!(outcome.success);
    assert!(fixture.executor.shuffle_active());
    assert!(fixture.executor.shuffle_info().contains("30"));

    // Not yet due
    let now = Instant::now();
    {
        let mut ctx = ExecCtx {
            engine: &mut fixture.engine,
            registry: &fixture.registry,
            themes: &fixture.themes,
            config: None,
        };
        assert!(fixture.executor.poll_shuffle(now, &mut ctx).is_none());

        // One interval later: fires exactly once
        let later = now + Duration::from_secs(31);
        let fired = fixture.executor.poll_shuffle(later, &mut ctx);
        assert!(fired.is_some());
        assert!(fired.unwrap().success);
        assert!(fixture.executor.poll_shuffle(later, &mut ctx).is_none());
    }

    // Re-invoking the same toggle disables it
    let off = fixture.run("0!");
    assert!(off.success);
    assert!(!fixture.executor.shuffle_active());
    assert_eq!(fixture.executor.shuffle_info(), "");
}

#[test]
fn shuffle_interval_validation() {
    let mut fixture = Fixture::new();
    assert!(!fixture.run("0!0").success);
    assert!(!fixture.run("0!301").success);
    assert!(fixture.run("0!300").success);
}

#[test]
fn reserved_commands_report_not_implemented() {
    let mut fixture = Fixture::new();
    for cmd in ["0h", "0\\", "0."] {
        let outcome = fixture.run(cmd);
        assert!(!outcome.success);
        assert!(outcome.message.contains("not implemented"));
    }
}

#[test]
fn search_finds_patterns_and_themes() {
    let mut fixture = Fixture::new();
    let outcome = fixture.run("0/fire");
    assert!(outcome.success);
    assert!(outcome.message.contains("fireworks"));
    assert!(outcome.message.contains("fire"));

    let none = fixture.run("0/zzz");
    assert!(none.success);
    assert!(none.message.contains("No matches"));
}

#[test]
fn listings_mark_current_selection() {
    let mut fixture = Fixture::new();
    let patterns = fixture.run("0p");
    assert!(patterns.success);
    assert!(patterns.message.contains("1:waves*"));

    let themes = fixture.run("0t");
    assert!(themes.success);
    assert!(themes.message.contains("1:classic*"));
}

#[test]
fn random_all_lands_on_registered_state() {
    let mut fixture = Fixture::new();
    let outcome = fixture.run("0**");
    assert!(outcome.success, "{}", outcome.message);
    assert!(fixture.executor.pattern_index() < fixture.registry.len());
    assert!(fixture.executor.theme_index() < fixture.themes.len());
}
