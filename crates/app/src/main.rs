use std::fs;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context as _;
use chrono::Local;
use directories::ProjectDirs;
use homedeck_application::AppContext;
use homedeck_core::{BookmarkNode, FeedSource, FragmentEntry, LinkRecord};
use homedeck_engine::{backgrounds, bookmarks, fragments::FragmentStore, links, opml};
use homedeck_storage::{Storage, VisitedSync};
use homedeck_ui::{Ui, UiExit};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dirs =
        ProjectDirs::from("dev", "homedeck", "homedeck").context("resolve project dirs")?;

    let config_dir = project_dirs.config_dir().to_path_buf();
    fs::create_dir_all(&config_dir)
        .with_context(|| format!("create config dir {}", config_dir.display()))?;

    init_tracing(&config_dir)?;
    tracing::info!(dir = %config_dir.display(), "starting");

    let db_path = config_dir.join("homedeck.db");
    let storage = Storage::open(&db_path)?;
    let settings = storage.load_settings()?;

    let sync = VisitedSync::from_env();
    if !sync.has_remote() {
        tracing::info!("no remote visited store configured; local tier only");
    }
    let visited = sync.load(&storage);

    let mut ctx = AppContext::new(settings)
        .with_visited(visited)
        .with_background(pick_background(&config_dir));
    load_data_files(&mut ctx, &config_dir);

    let notes_root = config_dir.join("notes");
    loop {
        let mut ui = Ui::new(ctx, &notes_root);
        let outcome = ui.run()?;
        ctx = outcome.ctx;

        storage.save_settings(&ctx.settings)?;
        flush_visited(&sync, &storage, &mut ctx);

        match outcome.exit {
            UiExit::Quit => break,
            UiExit::Reload => {
                load_data_files(&mut ctx, &config_dir);
            }
        }
    }

    Ok(())
}

fn init_tracing(config_dir: &Path) -> anyhow::Result<()> {
    let log_path = config_dir.join("homedeck.log");
    let file = fs::File::create(&log_path)
        .with_context(|| format!("create log file {}", log_path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Every data file is optional: a missing or unreadable one degrades to an
/// empty collection, logged but never fatal.
fn load_data_files(ctx: &mut AppContext, config_dir: &Path) {
    ctx.links = read_links(&config_dir.join("applinks.txt"));
    ctx.panel_links = read_links(&config_dir.join("panellinks.txt"));

    let tree = load_bookmark_tree(&config_dir.join("bookmarks"));
    ctx.bookmark_links = tree.flatten();
    ctx.bookmark_tree = Some(tree);

    ctx.feed_sources = load_feed_sources(&config_dir.join("feeds.opml"));
    ctx.notes_menu = load_notes_menu(&config_dir.join("notes"));

    tracing::info!(
        links = ctx.links.len(),
        panel_links = ctx.panel_links.len(),
        bookmarks = ctx.bookmark_links.len(),
        feeds = ctx.feed_sources.len(),
        "data files loaded"
    );
}

fn read_links(path: &Path) -> Vec<LinkRecord> {
    match fs::read_to_string(path) {
        Ok(text) => links::parse_links(&text),
        Err(err) => {
            tracing::info!(file = %path.display(), "links file unavailable: {err}");
            Vec::new()
        }
    }
}

/// No export found or an unreadable one both land on an empty tree: the
/// browser shows "no bookmarks" rather than refusing to open.
fn load_bookmark_tree(dir: &Path) -> BookmarkNode {
    let today = Local::now().date_naive();
    let Some(export) = bookmarks::discover_export(dir, today) else {
        tracing::info!(dir = %dir.display(), "no bookmark export found");
        return BookmarkNode::root(Vec::new());
    };
    match fs::read_to_string(&export) {
        Ok(html) => {
            let tree = bookmarks::parse_export(&html);
            tracing::info!(
                file = %export.display(),
                links = tree.link_count(),
                "bookmark export loaded"
            );
            tree
        }
        Err(err) => {
            tracing::warn!(file = %export.display(), "bookmark export unreadable: {err}");
            BookmarkNode::root(Vec::new())
        }
    }
}

fn load_feed_sources(path: &Path) -> Vec<FeedSource> {
    match fs::read_to_string(path) {
        Ok(text) => opml::parse(&text),
        Err(err) => {
            tracing::info!(file = %path.display(), "feed list unavailable: {err}");
            Vec::new()
        }
    }
}

fn load_notes_menu(dir: &Path) -> Vec<FragmentEntry> {
    FragmentStore::new(dir).menu()
}

fn pick_background(config_dir: &Path) -> Option<String> {
    let list_path = config_dir.join("backgrounds").join("backgrounds.txt");
    let text = fs::read_to_string(list_path).ok()?;
    let names = backgrounds::parse_list(&text);
    let chosen = backgrounds::pick(&names, backgrounds::session_seed())?.clone();
    tracing::info!(background = %chosen, "session background picked");
    Some(chosen)
}

/// Two-tier flush: the full visited set goes to the remote document (best
/// effort), the new URLs always land locally.
fn flush_visited(sync: &VisitedSync, storage: &Storage, ctx: &mut AppContext) {
    if ctx.dirty_visited.is_empty() {
        return;
    }
    let mut full: Vec<String> = ctx.visited.iter().cloned().collect();
    full.sort();
    sync.flush(storage, &full, &ctx.dirty_visited);
    ctx.dirty_visited.clear();
}
