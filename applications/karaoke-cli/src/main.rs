/// Karaoke - headless command-line karaoke player
mod config;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use config::CliConfig;
use karaoke_api_client::KaraokeApiClient;
use karaoke_core::{Playlist, PlaylistId, PlaylistStore, TrackRepository};
use karaoke_playback::effects::{format_frequency, format_level};
use karaoke_playback::{
    AudioEffectsManager, PlayerHandle, RepeatMode, SessionState, SharedEffects,
    SimulatedEffectsBackend, SimulatedEngine,
};
use karaoke_storage::JsonPlaylistStore;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Longest wait for a playlist or catalog operation
const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "karaoke")]
#[command(about = "Headless karaoke player", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./karaoke.toml if present)
    #[arg(short, long, global = true, env = "KARAOKE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List known playlists, refreshing missing names from the API
    Playlists,
    /// Add a playlist by its remote id
    AddPlaylist {
        /// Remote playlist id
        id: String,
    },
    /// Remove a playlist from the local catalog
    RemovePlaylist {
        /// Remote playlist id
        id: String,
    },
    /// Print the songs of a playlist
    Tracks {
        /// Remote playlist id
        id: String,
    },
    /// Load every known playlist and report the merged catalog
    Catalog,
    /// Play a playlist on the simulated engine
    Play {
        /// Remote playlist id
        id: String,
        /// Index of the song to start with
        #[arg(short, long, default_value_t = 0)]
        track: usize,
        /// Enable shuffle
        #[arg(long)]
        shuffle: bool,
        /// Repeat mode (overrides the configuration)
        #[arg(long, value_enum)]
        repeat: Option<RepeatArg>,
        /// Stop after this many seconds
        #[arg(long, default_value_t = 60)]
        seconds: u64,
        /// Equalizer preset index
        #[arg(long)]
        preset: Option<u16>,
        /// Bass boost strength (0-1000)
        #[arg(long)]
        bass_boost: Option<i32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RepeatArg {
    Off,
    All,
    One,
}

impl From<RepeatArg> for RepeatMode {
    fn from(arg: RepeatArg) -> Self {
        match arg {
            RepeatArg::Off => RepeatMode::Off,
            RepeatArg::All => RepeatMode::All,
            RepeatArg::One => RepeatMode::One,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "karaoke=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Playlists => list_playlists(&config).await,
        Commands::AddPlaylist { id } => add_playlist(&config, id).await,
        Commands::RemovePlaylist { id } => remove_playlist(&config, &id).await,
        Commands::Tracks { id } => list_tracks(&config, &id).await,
        Commands::Catalog => load_catalog(&config).await,
        Commands::Play {
            id,
            track,
            shuffle,
            repeat,
            seconds,
            preset,
            bass_boost,
        } => {
            let options = PlayOptions {
                track,
                shuffle,
                repeat: repeat.map(RepeatMode::from),
                duration: Duration::from_secs(seconds),
                preset,
                bass_boost,
            };
            play(&config, &id, options).await
        }
    }
}

struct PlayOptions {
    track: usize,
    shuffle: bool,
    repeat: Option<RepeatMode>,
    duration: Duration,
    preset: Option<u16>,
    bass_boost: Option<i32>,
}

fn repository(config: &CliConfig) -> anyhow::Result<Arc<KaraokeApiClient>> {
    let client = KaraokeApiClient::new(config.api.clone()).context("Invalid API configuration")?;
    Ok(Arc::new(client))
}

async fn store(config: &CliConfig) -> anyhow::Result<Arc<JsonPlaylistStore>> {
    let seed = config
        .storage
        .seed_playlists
        .iter()
        .map(|id| Playlist::new(id.as_str(), ""))
        .collect();
    let store = JsonPlaylistStore::open_with_seed(&config.storage.playlists_path, seed)
        .await
        .with_context(|| {
            format!(
                "Failed to open playlist catalog at {}",
                config.storage.playlists_path.display()
            )
        })?;
    Ok(Arc::new(store))
}

/// Start a player on the simulated engine
async fn start_player(
    config: &CliConfig,
    effects: Option<SharedEffects>,
) -> anyhow::Result<(PlayerHandle, SimulatedEngine)> {
    let (engine, events) =
        SimulatedEngine::new(Duration::from_secs(config.engine.track_length_secs));
    let player = PlayerHandle::start(
        Arc::new(engine.clone()),
        events,
        repository(config)?,
        store(config).await?,
        config.player.clone(),
        effects,
    );
    Ok((player, engine))
}

async fn wait_for(
    player: &PlayerHandle,
    what: &str,
    predicate: impl FnMut(&SessionState) -> bool,
) -> anyhow::Result<SessionState> {
    let state = tokio::time::timeout(OPERATION_TIMEOUT, player.wait_for(predicate))
        .await
        .with_context(|| format!("Timed out waiting for {what}"))??;
    Ok(state)
}

async fn list_playlists(config: &CliConfig) -> anyhow::Result<()> {
    let store = store(config).await?;
    let repository = repository(config)?;

    for playlist in store.playlists().await? {
        let playlist = if playlist.needs_refresh() {
            match repository.fetch_playlist_info(&playlist.id).await {
                Ok(info) => {
                    let merged = playlist.merged_with(&info);
                    store.update(merged.clone()).await?;
                    merged
                }
                Err(e) => {
                    tracing::warn!(playlist_id = %playlist.id, error = %e, "Could not refresh playlist");
                    playlist
                }
            }
        } else {
            playlist
        };

        let title = if playlist.title.is_empty() {
            "(unnamed)"
        } else {
            playlist.title.as_str()
        };
        println!("{:<40} {}", playlist.id.as_str(), title);
    }
    println!("\nCatalog file: {}", store.file_path().display());
    Ok(())
}

async fn add_playlist(config: &CliConfig, id: String) -> anyhow::Result<()> {
    let (player, _) = start_player(config, None).await?;
    let id = PlaylistId::new(id);
    player.clear_error()?;
    player.add_playlist_by_id(id.clone())?;

    let state = wait_for(&player, "the playlist to be added", |s| {
        s.last_error.is_some() || s.available_playlists.iter().any(|p| p.id == id)
    })
    .await?;
    player.shutdown().await;

    if let Some(error) = state.last_error {
        anyhow::bail!(error);
    }
    if let Some(playlist) = state.available_playlists.iter().find(|p| p.id == id) {
        println!("Added {} ({})", playlist.title, playlist.id);
    }
    Ok(())
}

async fn remove_playlist(config: &CliConfig, id: &str) -> anyhow::Result<()> {
    let store = store(config).await?;
    if store.remove(&PlaylistId::new(id)).await? {
        println!("Removed {id}");
    } else {
        println!("{id} is not in the catalog");
    }
    Ok(())
}

async fn list_tracks(config: &CliConfig, id: &str) -> anyhow::Result<()> {
    let repository = repository(config)?;
    let tracks = repository.fetch_tracks(&PlaylistId::new(id)).await?;

    for (index, track) in tracks.iter().enumerate() {
        let marker = if track.is_playable() { ' ' } else { '!' };
        println!("{index:>3}{marker} {} - {}", track.title, track.artist_label());
    }
    println!("\n{} songs", tracks.len());
    Ok(())
}

async fn load_catalog(config: &CliConfig) -> anyhow::Result<()> {
    let playlists = store(config).await?.playlists().await?.len();
    if playlists == 0 {
        println!("No playlists in the catalog");
        return Ok(());
    }

    let (player, _) = start_player(config, None).await?;
    wait_for(&player, "the playlist catalog", |s| {
        !s.available_playlists.is_empty()
    })
    .await?;

    player.load_full_catalog()?;
    let state = wait_for(&player, "the full catalog", |s| {
        s.catalog_loaded || (!s.is_catalog_loading && s.last_error.is_some())
    })
    .await?;
    player.shutdown().await;

    if let Some(error) = &state.last_error {
        tracing::warn!(error = %error, "Catalog loaded with errors");
    }
    let playable = state.catalog_tracks.iter().filter(|t| t.is_playable()).count();
    println!(
        "{} songs ({} playable) from {} playlists",
        state.catalog_tracks.len(),
        playable,
        playlists
    );
    Ok(())
}

async fn play(config: &CliConfig, id: &str, options: PlayOptions) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(repeat) = options.repeat {
        config.player.repeat = repeat;
    }

    let effects = AudioEffectsManager::shared(Box::new(SimulatedEffectsBackend::new()));
    {
        let mut effects = effects.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(preset) = options.preset {
            effects.set_enabled(true)?;
            effects.use_preset(preset)?;
        }
        if let Some(strength) = options.bass_boost {
            effects.set_bass_boost_enabled(true)?;
            effects.set_bass_boost_strength(strength)?;
        }
    }

    let (player, _engine) = start_player(&config, Some(Arc::clone(&effects))).await?;

    player.load_playlist(id)?;
    let state = wait_for(&player, "the playlist", |s| {
        !s.is_loading && (!s.playlist_tracks.is_empty() || s.last_error.is_some())
    })
    .await?;
    if let Some(error) = state.last_error {
        player.shutdown().await;
        anyhow::bail!(error);
    }

    let Some(track) = state.playlist_tracks.get(options.track) else {
        player.shutdown().await;
        anyhow::bail!(
            "Playlist has {} songs, no song {}",
            state.playlist_tracks.len(),
            options.track
        );
    };
    player.play_track_by_id(track.id.clone())?;
    if options.shuffle {
        player.toggle_shuffle()?;
    }

    let mut updates = player.subscribe();
    let deadline = tokio::time::sleep(options.duration);
    tokio::pin!(deadline);
    let mut now_playing = None;
    let mut last_second = None;

    loop {
        tokio::select! {
            () = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                render(&state, &mut now_playing, &mut last_second);
            }
        }
    }

    let effects = effects.lock().unwrap_or_else(PoisonError::into_inner).state();
    player.shutdown().await;
    if let Some(preset) = effects.current_preset.and_then(|p| effects.presets.get(usize::from(p))) {
        println!("Equalizer preset: {}", preset.name);
    }
    if effects.is_enabled && !effects.bands.is_empty() {
        let bands: Vec<_> = effects
            .bands
            .iter()
            .map(|b| {
                format!(
                    "{} {}",
                    format_frequency(b.center_frequency_mhz),
                    format_level(i32::from(b.current_level_mb))
                )
            })
            .collect();
        println!("Equalizer: {}", bands.join(", "));
    }
    if effects.bass_boost_enabled {
        println!("Bass boost: {}", effects.bass_boost_strength);
    }
    Ok(())
}

/// Print track changes and a progress line once per second
fn render(state: &SessionState, now_playing: &mut Option<String>, last_second: &mut Option<u64>) {
    if let Some(error) = &state.last_error {
        eprintln!("error: {error}");
    }
    let Some(track) = &state.current_track else {
        return;
    };

    if now_playing.as_deref() != Some(track.id.as_str()) {
        *now_playing = Some(track.id.as_str().to_string());
        *last_second = None;
        println!("\n> {} - {}", track.title, track.artist_label());
    }

    let second = state.position_ms / 1000;
    if state.is_playing && *last_second != Some(second) {
        *last_second = Some(second);
        println!(
            "  {} / {} [{:>3.0}%] repeat={:?} shuffle={}",
            format_time(state.position_ms),
            format_time(state.duration_ms),
            state.progress * 100.0,
            state.repeat_mode,
            state.is_shuffle_enabled,
        );
    }
}

fn format_time(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}
