// (C) 2025 - Enzo Lombardi

//! Command executor - applies parsed commands to engine, pattern,
//! theme and favorite state, and owns the shuffle scheduler.
//!
//! Every execution returns an [`ExecOutcome`]; failures carry an
//! explanatory message and mutate nothing. Mutations flow through an
//! [`ExecCtx`] borrowed from the application for the duration of one
//! command, keeping ownership a DAG.

use std::time::{Duration, Instant};

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::parser::{ParsedCommand, SpecialKind, Target};
use crate::config::{ConfigStore, FavoriteSlot, now_iso8601};
use crate::core::theme::ThemeSet;
use crate::engine::AnimationEngine;
use crate::patterns::PatternRegistry;

pub const SHUFFLE_DEFAULT_SECS: u64 = 10;
pub const SHUFFLE_MIN_SECS: u64 = 1;
pub const SHUFFLE_MAX_SECS: u64 = 300;

/// Result of executing one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
    pub success: bool,
    pub message: String,
}

impl ExecOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// Mutable state a command may touch, borrowed per execution.
pub struct ExecCtx<'a> {
    pub engine: &'a mut AnimationEngine,
    pub registry: &'a PatternRegistry,
    pub themes: &'a ThemeSet,
    pub config: Option<&'a mut ConfigStore>,
}

#[derive(Debug, Clone, Copy)]
struct ShuffleState {
    all: bool,
    interval: Duration,
    next_fire: Instant,
}

/// Applies commands and keeps the current pattern/theme indices in sync
/// with keyboard-driven changes via [`update_state`](Self::update_state).
pub struct CommandExecutor {
    pattern_index: usize,
    theme_index: usize,
    shuffle: Option<ShuffleState>,
    rng: StdRng,
}

impl CommandExecutor {
    pub fn new(pattern_index: usize, theme_index: usize) -> Self {
        Self::with_seed_from(pattern_index, theme_index, StdRng::from_entropy())
    }

    /// Deterministic construction for tests.
    pub fn with_seed(pattern_index: usize, theme_index: usize, seed: u64) -> Self {
        Self::with_seed_from(pattern_index, theme_index, StdRng::seed_from_u64(seed))
    }

    fn with_seed_from(pattern_index: usize, theme_index: usize, rng: StdRng) -> Self {
        Self {
            pattern_index,
            theme_index,
            shuffle: None,
            rng,
        }
    }

    pub fn pattern_index(&self) -> usize {
        self.pattern_index
    }

    pub fn theme_index(&self) -> usize {
        self.theme_index
    }

    /// Keep indices in sync after direct keyboard-driven changes.
    pub fn update_state(&mut self, pattern_index: usize, theme_index: usize) {
        self.pattern_index = pattern_index;
        self.theme_index = theme_index;
    }

    pub fn shuffle_active(&self) -> bool {
        self.shuffle.is_some()
    }

    /// Short human description of the shuffle state; empty when off.
    pub fn shuffle_info(&self) -> String {
        match self.shuffle {
            Some(s) => format!(
                "shuffle {} every {}s",
                if s.all { "all" } else { "presets" },
                s.interval.as_secs()
            ),
            None => String::new(),
        }
    }

    /// Stop the shuffle timer (called on shutdown).
    pub fn cleanup(&mut self) {
        self.shuffle = None;
    }

    /// Fire the shuffle action if its interval elapsed.
    pub fn poll_shuffle(&mut self, now: Instant, ctx: &mut ExecCtx) -> Option<ExecOutcome> {
        let state = self.shuffle.as_mut()?;
        if now < state.next_fire {
            return None;
        }
        state.next_fire = now + state.interval;
        let all = state.all;
        Some(if all {
            self.random_all(ctx)
        } else {
            self.random_preset(ctx)
        })
    }

    /// Execute one parsed command.
    pub fn execute(&mut self, cmd: &ParsedCommand, ctx: &mut ExecCtx) -> ExecOutcome {
        match cmd {
            ParsedCommand::Preset { number, .. } => self.apply_preset(*number, ctx),
            ParsedCommand::Pattern { target, preset, .. } => {
                self.switch_pattern(target, *preset, ctx)
            }
            ParsedCommand::Theme { target, .. } => self.switch_theme(target, ctx),
            ParsedCommand::FavoriteLoad { slot, .. } => self.load_favorite(*slot, ctx),
            ParsedCommand::FavoriteSave { slot, .. } => self.save_favorite(*slot, ctx),
            ParsedCommand::Special { kind, arg, .. } => self.special(*kind, arg.as_deref(), ctx),
            ParsedCommand::Combination { parts, .. } => self.combination(parts, ctx),
        }
    }

    fn apply_preset(&mut self, number: u32, ctx: &mut ExecCtx) -> ExecOutcome {
        let name = ctx.engine.pattern().name();
        if ctx.registry.presets(self.pattern_index).is_empty() {
            return ExecOutcome::fail(format!("{} does not support presets", name));
        }
        if ctx.engine.pattern_mut().apply_preset(number) {
            ExecOutcome::ok(format!("Applied preset {} to {}", number, name))
        } else {
            ExecOutcome::fail(format!("{} has no preset {}", name, number))
        }
    }

    fn switch_pattern(
        &mut self,
        target: &Target,
        preset: Option<u32>,
        ctx: &mut ExecCtx,
    ) -> ExecOutcome {
        let Some(index) = self.resolve_pattern(target, ctx.registry) else {
            return ExecOutcome::fail(format!("Unknown pattern: {}", target_text(target)));
        };
        self.install_pattern(index, ctx);
        let name = ctx.registry.name_of(index).unwrap_or("?");

        match preset {
            Some(p) => {
                if ctx.engine.pattern_mut().apply_preset(p) {
                    ExecOutcome::ok(format!("Pattern: {} (preset {})", name, p))
                } else {
                    ExecOutcome::ok(format!("Pattern: {} (preset {} not available)", name, p))
                }
            }
            None => ExecOutcome::ok(format!("Pattern: {}", name)),
        }
    }

    fn switch_theme(&mut self, target: &Target, ctx: &mut ExecCtx) -> ExecOutcome {
        let key = target_text(target);
        let Some(index) = ctx.themes.resolve(&key) else {
            return ExecOutcome::fail(format!("Unknown theme: {}", key));
        };
        self.install_theme(index, ctx);
        let name = ctx.themes.get(index).map_or("?", |t| t.name());
        ExecOutcome::ok(format!("Theme: {}", name))
    }

    fn load_favorite(&mut self, slot: u32, ctx: &mut ExecCtx) -> ExecOutcome {
        let Some(config) = ctx.config.as_deref() else {
            return ExecOutcome::fail("Favorites unavailable (no config store)");
        };
        let Some(favorite) = config.get_favorite(slot).cloned() else {
            return ExecOutcome::fail(format!("Favorite slot {} is empty", slot));
        };
        let Some(pattern_index) = ctx.registry.resolve(&favorite.pattern_name) else {
            return ExecOutcome::fail(format!("Favorite pattern '{}' no longer exists", favorite.pattern_name));
        };
        let Some(theme_index) = ctx.themes.resolve(&favorite.theme_name) else {
            return ExecOutcome::fail(format!("Favorite theme '{}' no longer exists", favorite.theme_name));
        };

        if theme_index != self.theme_index {
            self.theme_index = theme_index;
        }
        self.install_pattern(pattern_index, ctx);
        if let Some(p) = favorite.preset {
            ctx.engine.pattern_mut().apply_preset(p);
        }

        let mut message = format!(
            "Favorite {}: {} / {}",
            slot, favorite.pattern_name, favorite.theme_name
        );
        if let Some(note) = &favorite.note {
            message.push_str(&format!(" ({})", note));
        }
        ExecOutcome::ok(message)
    }

    fn save_favorite(&mut self, slot: u32, ctx: &mut ExecCtx) -> ExecOutcome {
        let pattern_name = ctx.engine.pattern().name().to_string();
        let theme_name = ctx
            .themes
            .get(self.theme_index)
            .map_or(String::new(), |t| t.name().to_string());
        let Some(config) = ctx.config.as_deref_mut() else {
            return ExecOutcome::fail("Favorites unavailable (no config store)");
        };
        let favorite = FavoriteSlot {
            pattern_name: pattern_name.clone(),
            theme_name: theme_name.clone(),
            preset: None,
            note: None,
            saved_at: now_iso8601(),
        };
        match config.save_favorite(slot, favorite) {
            Ok(()) => ExecOutcome::ok(format!("Saved favorite {}: {} / {}", slot, pattern_name, theme_name)),
            Err(e) => ExecOutcome::fail(format!("Could not save favorite {}: {}", slot, e)),
        }
    }

    fn special(&mut self, kind: SpecialKind, arg: Option<&str>, ctx: &mut ExecCtx) -> ExecOutcome {
        match kind {
            SpecialKind::ListPresets => {
                let presets = ctx.registry.presets(self.pattern_index);
                let name = ctx.engine.pattern().name();
                if presets.is_empty() {
                    return ExecOutcome::ok(format!("{} has no presets", name));
                }
                let list = presets
                    .iter()
                    .map(|p| format!("{}:{}", p.id, p.name))
                    .collect::<Vec<_>>()
                    .join(" ");
                ExecOutcome::ok(format!("{}: {}", name, list))
            }
            SpecialKind::CatalogAll => {
                let entries = (0..ctx.registry.len())
                    .map(|i| {
                        let name = ctx.registry.name_of(i).unwrap_or("?");
                        format!("{} ({} presets)", name, ctx.registry.presets(i).len())
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                ExecOutcome::ok(entries)
            }
            SpecialKind::ListPatterns => {
                let list = ctx
                    .registry
                    .names()
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let marker = if i == self.pattern_index { "*" } else { "" };
                        format!("{}:{}{}", i + 1, name, marker)
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                ExecOutcome::ok(format!("Patterns: {}", list))
            }
            SpecialKind::ListThemes => {
                let list = ctx
                    .themes
                    .names()
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let marker = if i == self.theme_index { "*" } else { "" };
                        format!("{}:{}{}", i + 1, name, marker)
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                ExecOutcome::ok(format!("Themes: {}", list))
            }
            SpecialKind::ListFavorites => {
                let Some(config) = ctx.config.as_deref() else {
                    return ExecOutcome::fail("Favorites unavailable (no config store)");
                };
                let favorites = config.get_all_favorites();
                if favorites.is_empty() {
                    return ExecOutcome::ok("No favorites saved");
                }
                let list = favorites
                    .iter()
                    .map(|(slot, f)| format!("f{}: {}/{}", slot, f.pattern_name, f.theme_name))
                    .collect::<Vec<_>>()
                    .join("  ");
                ExecOutcome::ok(list)
            }
            SpecialKind::RandomPreset => self.random_preset(ctx),
            SpecialKind::RandomAll => self.random_all(ctx),
            SpecialKind::RandomTheme => {
                let count = ctx.themes.len();
                if count == 0 {
                    return ExecOutcome::fail("No themes registered");
                }
                let mut index = self.rng.gen_range(0..count);
                if count > 1 && index == self.theme_index {
                    index = (index + 1) % count;
                }
                self.install_theme(index, ctx);
                let name = ctx.themes.get(index).map_or("?", |t| t.name());
                ExecOutcome::ok(format!("Theme: {}", name))
            }
            SpecialKind::Randomize => {
                let pattern = self.rng.gen_range(0..ctx.registry.len().max(1));
                let theme = self.rng.gen_range(0..ctx.themes.len().max(1));
                self.theme_index = theme.min(ctx.themes.len().saturating_sub(1));
                self.install_pattern(pattern, ctx);
                ExecOutcome::ok(format!(
                    "Randomized: {} / {}",
                    ctx.registry.name_of(self.pattern_index).unwrap_or("?"),
                    ctx.themes.get(self.theme_index).map_or("?", |t| t.name())
                ))
            }
            SpecialKind::SaveConfig => {
                let pattern_name = ctx.engine.pattern().name().to_string();
                let theme_name = ctx
                    .themes
                    .get(self.theme_index)
                    .map_or(String::new(), |t| t.name().to_string());
                let fps = ctx.engine.fps();
                let mouse = ctx.engine.renderer_mut().mouse_enabled();
                let Some(config) = ctx.config.as_deref_mut() else {
                    return ExecOutcome::fail("Config store unavailable");
                };
                config.set_snapshot(&pattern_name, &theme_name, fps, mouse);
                match config.save() {
                    Ok(()) => ExecOutcome::ok("Configuration saved"),
                    Err(e) => ExecOutcome::fail(format!("Save failed: {}", e)),
                }
            }
            SpecialKind::ResetPattern => {
                ctx.engine.pattern_mut().reset();
                ExecOutcome::ok(format!("Reset {}", ctx.engine.pattern().name()))
            }
            SpecialKind::Shuffle => self.toggle_shuffle(false, arg),
            SpecialKind::ShuffleAll => self.toggle_shuffle(true, arg),
            SpecialKind::Search => {
                let Some(term) = arg else {
                    return ExecOutcome::fail("Search needs a term");
                };
                let needle = term.to_lowercase();
                let patterns = ctx.registry.search(&needle);
                let themes: Vec<&str> = ctx
                    .themes
                    .names()
                    .into_iter()
                    .filter(|n| n.contains(&needle))
                    .collect();
                if patterns.is_empty() && themes.is_empty() {
                    return ExecOutcome::ok(format!("No matches for '{}'", term));
                }
                let mut parts = Vec::new();
                if !patterns.is_empty() {
                    parts.push(format!("patterns: {}", patterns.join(", ")));
                }
                if !themes.is_empty() {
                    parts.push(format!("themes: {}", themes.join(", ")));
                }
                ExecOutcome::ok(parts.join(" | "))
            }
            SpecialKind::History => ExecOutcome::fail("History is not implemented"),
            SpecialKind::Undo => ExecOutcome::fail("Undo is not implemented"),
            SpecialKind::Repeat => ExecOutcome::fail("Repeat is not implemented"),
        }
    }

    fn combination(&mut self, parts: &[ParsedCommand], ctx: &mut ExecCtx) -> ExecOutcome {
        let mut messages = Vec::with_capacity(parts.len());
        let mut success = true;
        for part in parts {
            let outcome = self.execute(part, ctx);
            if outcome.success {
                messages.push(outcome.message);
            } else {
                success = false;
                messages.push(format!("✗ {}", outcome.message));
            }
        }
        ExecOutcome {
            success,
            message: messages.join(" | "),
        }
    }

    fn toggle_shuffle(&mut self, all: bool, arg: Option<&str>) -> ExecOutcome {
        // Re-invoking the active mode disables it; switching modes
        // restarts the timer.
        if let Some(state) = self.shuffle {
            if state.all == all {
                self.shuffle = None;
                return ExecOutcome::ok("Shuffle off");
            }
        }

        let secs = match arg {
            Some(text) => match text.parse::<u64>() {
                Ok(n) if (SHUFFLE_MIN_SECS..=SHUFFLE_MAX_SECS).contains(&n) => n,
                _ => {
                    return ExecOutcome::fail(format!(
                        "Shuffle interval must be {}-{} seconds",
                        SHUFFLE_MIN_SECS, SHUFFLE_MAX_SECS
                    ));
                }
            },
            None => SHUFFLE_DEFAULT_SECS,
        };
        let interval = Duration::from_secs(secs);
        self.shuffle = Some(ShuffleState {
            all,
            interval,
            next_fire: Instant::now() + interval,
        });
        ExecOutcome::ok(format!(
            "Shuffle {} every {}s",
            if all { "all" } else { "presets" },
            secs
        ))
    }

    fn random_preset(&mut self, ctx: &mut ExecCtx) -> ExecOutcome {
        let presets = ctx.registry.presets(self.pattern_index);
        let name = ctx.engine.pattern().name();
        if presets.is_empty() {
            return ExecOutcome::fail(format!("{} does not support presets", name));
        }
        let pick = presets[self.rng.gen_range(0..presets.len())].id;
        if ctx.engine.pattern_mut().apply_preset(pick) {
            ExecOutcome::ok(format!("Applied preset {} to {}", pick, name))
        } else {
            ExecOutcome::fail(format!("{} rejected preset {}", name, pick))
        }
    }

    fn random_all(&mut self, ctx: &mut ExecCtx) -> ExecOutcome {
        if ctx.registry.is_empty() || ctx.themes.is_empty() {
            return ExecOutcome::fail("Nothing to randomize");
        }
        self.theme_index = self.rng.gen_range(0..ctx.themes.len());
        let pattern = self.rng.gen_range(0..ctx.registry.len());
        self.install_pattern(pattern, ctx);

        let presets = ctx.registry.presets(pattern);
        let mut applied = None;
        if !presets.is_empty() {
            let pick = presets[self.rng.gen_range(0..presets.len())].id;
            if ctx.engine.pattern_mut().apply_preset(pick) {
                applied = Some(pick);
            }
        }

        let name = ctx.registry.name_of(pattern).unwrap_or("?");
        let theme = ctx.themes.get(self.theme_index).map_or("?", |t| t.name());
        match applied {
            Some(p) => ExecOutcome::ok(format!("Random: {} preset {} / {}", name, p, theme)),
            None => ExecOutcome::ok(format!("Random: {} / {}", name, theme)),
        }
    }

    fn resolve_pattern(&self, target: &Target, registry: &PatternRegistry) -> Option<usize> {
        match target {
            Target::Index(n) => {
                let n = *n as usize;
                (n >= 1 && n <= registry.len()).then(|| n - 1)
            }
            Target::Name(name) => registry.resolve(name),
        }
    }

    /// Build and install the pattern at `index` with the current theme.
    fn install_pattern(&mut self, index: usize, ctx: &mut ExecCtx) {
        let Some(theme) = ctx.themes.get(self.theme_index) else {
            return;
        };
        if let Some(pattern) = ctx.registry.build(index, theme) {
            self.pattern_index = index;
            ctx.engine.set_pattern(pattern);
        }
    }

    /// Switch theme: rebuild the active pattern with the new palette
    /// and re-install it.
    fn install_theme(&mut self, index: usize, ctx: &mut ExecCtx) {
        self.theme_index = index;
        if let Some(theme) = ctx.themes.get(index) {
            if let Some(pattern) = ctx.registry.build(self.pattern_index, theme) {
                ctx.engine.set_pattern(pattern);
            }
            ctx.engine.note_theme_change(theme.name());
        }
    }
}

fn target_text(target: &Target) -> String {
    match target {
        Target::Index(n) => n.to_string(),
        Target::Name(name) => name.clone(),
    }
}
