use std::fmt;
use std::path::{Path, PathBuf};

use crossterm::style::Stylize;
use dialoguer::{Confirm, Input, Select};

use crate::animation::clock::MAX_FPS;
use crate::config::Config;
use crate::error::OnboardError;

// ── Styling helpers ──────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!(
        "{}",
        "┌───────────────────────────────────────┐".cyan().bold()
    );
    println!(
        "{}",
        "│      Welcome to skyline setup!        │".cyan().bold()
    );
    println!(
        "{}",
        "│  Let's tune your night-time skyline.  │".cyan().bold()
    );
    println!(
        "{}",
        "└───────────────────────────────────────┘".cyan().bold()
    );
    println!();
    println!(
        "{}",
        "  Tip: existing values are shown as defaults. Press Enter to keep them.".dim()
    );
    println!();
}

fn print_section(title: &str) {
    let line = "─".repeat(40 - title.len().min(38));
    println!();
    println!("{}", format!("── {title} {line}").cyan().bold());
    println!();
}

fn print_success(config_path: &Path) {
    println!();
    println!(
        "{}",
        "── All set! ────────────────────────────".green().bold()
    );
    println!();
    println!(
        "  Config saved to {}",
        config_path.display().to_string().bold()
    );
    println!();
    println!("  Run {} to start!", "skyline".green().bold());
    println!();
}

fn print_error(msg: &str) {
    println!("  {} {msg}", "Error:".red().bold());
}

fn current_hint(value: impl fmt::Display) -> String {
    format!("[current: {value}]").dim().to_string()
}

fn yes_no(val: bool) -> &'static str {
    if val { "yes" } else { "no" }
}

// ── Density presets ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DensityPreset {
    Calm,
    Default,
    Busy,
    Custom,
}

const DENSITY_PRESETS: &[DensityPreset] = &[
    DensityPreset::Calm,
    DensityPreset::Default,
    DensityPreset::Busy,
    DensityPreset::Custom,
];

impl DensityPreset {
    fn density(self) -> Option<i64> {
        match self {
            DensityPreset::Calm => Some(5),
            DensityPreset::Default => Some(15),
            DensityPreset::Busy => Some(30),
            DensityPreset::Custom => None,
        }
    }

    fn for_density(density: i64) -> Self {
        DENSITY_PRESETS
            .iter()
            .copied()
            .find(|p| p.density() == Some(density))
            .unwrap_or(DensityPreset::Custom)
    }
}

impl fmt::Display for DensityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DensityPreset::Calm => write!(f, "Calm (5 drifting decorations)"),
            DensityPreset::Default => write!(f, "Default (15 drifting decorations)"),
            DensityPreset::Busy => write!(f, "Busy (30 drifting decorations)"),
            DensityPreset::Custom => write!(f, "Custom number"),
        }
    }
}

/// Empty input clears the path.
fn parse_optional_path(input: &str) -> Option<PathBuf> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "none".to_string())
}

// ── Prompt helpers ───────────────────────────────────────────────────

fn prompt_density(current: i64) -> Result<i64, OnboardError> {
    let items: Vec<String> = DENSITY_PRESETS.iter().map(|p| p.to_string()).collect();
    let default = DENSITY_PRESETS
        .iter()
        .position(|p| *p == DensityPreset::for_density(current))
        .unwrap_or(1);

    let selection = Select::new()
        .with_prompt(format!("How lively should the sky be? {}", current_hint(current)))
        .items(&items)
        .default(default)
        .interact_opt()
        .map_err(|e| OnboardError::PromptError(e.to_string()))?
        .ok_or(OnboardError::Cancelled)?;

    match DENSITY_PRESETS[selection].density() {
        Some(density) => Ok(density),
        None => Input::new()
            .with_prompt("Number of drifting decorations")
            .default(current.max(0))
            .validate_with(|input: &i64| {
                if (0..=500).contains(input) {
                    Ok(())
                } else {
                    Err("Density must be between 0 and 500")
                }
            })
            .interact()
            .map_err(|e| OnboardError::PromptError(e.to_string())),
    }
}

fn prompt_star_count(current: i64) -> Result<i64, OnboardError> {
    Input::new()
        .with_prompt(format!("Number of stars {}", current_hint(current)))
        .default(current.max(0))
        .validate_with(|input: &i64| {
            if (0..=5000).contains(input) {
                Ok(())
            } else {
                Err("Star count must be between 0 and 5000")
            }
        })
        .interact()
        .map_err(|e| OnboardError::PromptError(e.to_string()))
}

fn prompt_fps(current: u32) -> Result<u32, OnboardError> {
    let hint = current_hint(current);
    Input::new()
        .with_prompt(format!("Frames per second (1 to {MAX_FPS}) {hint}"))
        .default(current)
        .validate_with(|input: &u32| {
            if (1..=MAX_FPS).contains(input) {
                Ok(())
            } else {
                Err("Frame rate must be between 1 and 240")
            }
        })
        .interact()
        .map_err(|e| OnboardError::PromptError(e.to_string()))
}

fn prompt_frame_skip(current: u32) -> Result<u32, OnboardError> {
    Input::new()
        .with_prompt(format!(
            "Drop every n-th frame (0 = never) {}",
            current_hint(current)
        ))
        .default(current)
        .interact()
        .map_err(|e| OnboardError::PromptError(e.to_string()))
}

fn prompt_path(label: &str, current: Option<&Path>) -> Result<Option<PathBuf>, OnboardError> {
    let input: String = Input::new()
        .with_prompt(format!(
            "{label} (leave empty for none) {}",
            current_hint(display_path(current))
        ))
        .default(current.map(|p| p.display().to_string()).unwrap_or_default())
        .allow_empty(true)
        .interact_text()
        .map_err(|e| OnboardError::PromptError(e.to_string()))?;

    let path = parse_optional_path(&input);
    if let Some(ref p) = path {
        if !p.exists() {
            print_error(&format!(
                "{} does not exist yet; it will be skipped until it does.",
                p.display()
            ));
        }
    }
    Ok(path)
}

fn prompt_confirm(question: &str, current: bool) -> Result<bool, OnboardError> {
    Confirm::new()
        .with_prompt(format!("{question} {}", current_hint(yes_no(current))))
        .default(current)
        .interact_opt()
        .map_err(|e| OnboardError::PromptError(e.to_string()))?
        .ok_or(OnboardError::Cancelled)
}

// ── Main onboarding flow ─────────────────────────────────────────────

pub fn run() -> Result<(), OnboardError> {
    print_banner();

    let config_path = Config::get_config_path()?;

    let mut config = if config_path.exists() {
        println!(
            "  {}",
            format!("Found existing config at {}", config_path.display()).dim()
        );
        match Config::load_from_path(&config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("  Warning: Failed to load config: {e}");
                eprintln!("  Starting with default settings.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    // ── Scene ────────────────────────────────────────────────
    print_section("Scene");

    config.decor.density = prompt_density(config.decor.density)?;
    config.scene.star_count = prompt_star_count(config.scene.star_count)?;

    // ── Animation ────────────────────────────────────────────
    print_section("Animation");

    config.clock.fps = prompt_fps(config.clock.fps)?;
    config.clock.frame_skip = prompt_frame_skip(config.clock.frame_skip)?;

    // ── Images ───────────────────────────────────────────────
    print_section("Images");

    config.sprite.path = prompt_path("Foreground sprite image", config.sprite.path.as_deref())?;
    if config.sprite.path.is_some() {
        config.sprite.show =
            prompt_confirm("Show the foreground sprite on start?", config.sprite.show)?;
    }
    config.decor.path = prompt_path("Drifting decoration image", config.decor.path.as_deref())?;

    // ── Output ───────────────────────────────────────────────
    print_section("Output");

    config.silent = prompt_confirm("Run silently (suppress non-error output)?", config.silent)?;

    if let Err(e) = config.validate() {
        print_error(&format!("Invalid config: {e}"));
        return Err(OnboardError::Config(e));
    }

    config.save(&config_path)?;

    print_success(&config_path);

    Ok(())
}
