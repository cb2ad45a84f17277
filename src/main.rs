use std::env;
use std::fs;
use std::path::Path;
use std::process;

use hymnal::page::{HymnPage, PageAction, PageElements, PageInit};
use hymnal::playback::CommandSource;
use hymnal::prefs::{self, JsonFileStore, LanguageToggle};
use hymnal::{format_timecode, parse_timecode, search, Config, Effect, EffectLog, Hymn, Site};

const USAGE: &str = "Usage: hymnal [--config <file.yaml>] <command> ...

Commands:
  locate <site.json> <level/year/hymn> <time>
  replay <site.json> <level/year/hymn> <time>...
  search <site.json> <query>
  page   <site.json> <level/year/hymn> <prefs.json> [action]...

Times are cue times like 6.5, 0:06.5 or 1:02:03.
Page actions: rec=<i> speed=<rate> lang=<code> font+ font- font=<px> at=<time> click=<row>";

const SPEED_CHIPS: [f64; 5] = [0.5, 0.75, 1.0, 1.25, 1.5];

fn usage_exit() -> ! {
    eprintln!("{}", USAGE);
    process::exit(1);
}

fn load_site(path: &str) -> Site {
    let source = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path, e);
            process::exit(1);
        }
    };
    match Site::from_json(&source) {
        Ok(site) => site,
        Err(e) => {
            eprintln!("Error loading '{}': {}", path, e);
            process::exit(1);
        }
    }
}

/// Remove `--config <file>` from `args` and load it.
fn take_config(args: &mut Vec<String>) -> Config {
    let Some(pos) = args.iter().position(|a| a == "--config") else {
        return Config::default();
    };
    if pos + 1 >= args.len() {
        usage_exit();
    }
    let path = args.remove(pos + 1);
    args.remove(pos);
    match Config::load(Path::new(&path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config '{}': {}", path, e);
            process::exit(1);
        }
    }
}

fn resolve_hymn<'a>(site: &'a Site, path: &str) -> &'a Hymn {
    match site.resolve(path) {
        Ok(hymn) => hymn,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn print_effects(label: &str, source: &mut CommandSource, view: &mut EffectLog) {
    let mut effects = source.drain();
    effects.extend(view.drain());
    for effect in effects {
        match serde_json::to_string(&effect) {
            Ok(json) => println!("{}\t{}", label, json),
            Err(e) => log::warn!("could not encode effect {:?}: {}", effect, e),
        }
    }
}

/// Mount the hymn page over a preference file and run `actions` against it.
fn run_page(config: Config, site: &Site, path: &str, prefs_path: &str, actions: &[String]) {
    let hymn = resolve_hymn(site, path);
    let actions: Vec<(&str, PageAction)> = actions
        .iter()
        .map(|a| match a.parse() {
            Ok(action) => (a.as_str(), action),
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        })
        .collect();

    let identifier = path.trim_matches('/');
    let page_key = prefs::page_key(
        config.storage.page_key,
        Some(identifier),
        &format!("/levels/{}", identifier),
    );
    log::info!("page key '{}', preferences in {}", page_key, prefs_path);

    let rows = hymn.rows(&site.languages);
    let elements = PageElements {
        audio: true,
        recording_select: true,
        font_controls: true,
        speed_chips: SPEED_CHIPS.to_vec(),
        language_toggles: site
            .languages
            .iter()
            .map(|l| LanguageToggle::new(l.code.clone(), l.default_on))
            .collect(),
    };
    let init = PageInit {
        config,
        page_key,
        store: JsonFileStore::open(prefs_path),
        elements,
        rows: Some(&rows),
        recordings: hymn.recordings.clone(),
    };

    let mut source = CommandSource::new();
    let mut view = EffectLog::new();
    let Some(mut page) = HymnPage::mount(init, &mut source, &mut view) else {
        eprintln!("Hymn '{}' has no transcript", hymn.slug);
        process::exit(1);
    };
    print_effects("mount", &mut source, &mut view);

    for (text, action) in &actions {
        if let PageAction::TimeUpdate { seconds } = action {
            source.report_position(*seconds);
        }
        if !page.apply(action, &mut source, &mut view) {
            println!("{}\t(no change)", text);
        }
        print_effects(text, &mut source, &mut view);
    }
}

fn parse_time_arg(arg: &str) -> i64 {
    match parse_timecode(arg) {
        Ok(ms) => ms as i64,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();

    let mut args: Vec<String> = env::args().collect();
    let config = take_config(&mut args);
    if args.len() < 4 {
        usage_exit();
    }

    let command = args[1].as_str();
    let site = load_site(&args[2]);
    log::info!("loaded {} hymns from {}", site.hymns().count(), args[2]);

    match command {
        "search" => {
            let query = args[3..].join(" ");
            let hymns: Vec<&hymnal::Hymn> = site.hymns().collect();
            let titles: Vec<&str> = hymns.iter().map(|h| h.title.as_str()).collect();
            let visible = search::filter(&query, &titles);
            for (hymn, shown) in hymns.iter().zip(visible) {
                if shown {
                    println!("{}\t{}", hymn.slug, hymn.title);
                }
            }
        }
        "page" => {
            if args.len() < 5 {
                usage_exit();
            }
            run_page(config, &site, &args[3], &args[4], &args[5..]);
        }
        "locate" | "replay" => {
            if args.len() < 5 || (command == "locate" && args.len() != 5) {
                usage_exit();
            }
            let hymn = resolve_hymn(&site, &args[3]);
            if hymn.segments.is_empty() {
                eprintln!("Hymn '{}' has no timed lyrics", hymn.slug);
                process::exit(1);
            }

            let positions: Vec<i64> = args[4..].iter().map(|a| parse_time_arg(a)).collect();

            if command == "locate" {
                let index = hymn.segment_index();
                let i = index.locate(positions[0]);
                let cue = &hymn.segments[i];
                let texts: Vec<String> = site
                    .languages
                    .iter()
                    .filter_map(|l| cue.text(&l.code).map(|t| format!("[{}] {}", l.code, t)))
                    .collect();
                println!("{}\t{}\t{}", i, format_timecode(cue.start_ms()), texts.join("  "));
                return;
            }

            for (t, effects) in hymnal::replay(hymn, &positions) {
                let moved = effects.iter().find_map(|e| match e {
                    Effect::Highlight { previous, next } => Some((*previous, *next)),
                    _ => None,
                });
                match moved {
                    Some((Some(prev), next)) => println!("{}\t{} -> {}", format_timecode(t as u64), prev, next),
                    Some((None, next)) => println!("{}\t-> {}", format_timecode(t as u64), next),
                    None => println!("{}\t(no change)", format_timecode(t as u64)),
                }
            }
        }
        _ => usage_exit(),
    }
}
