//! Deckforge headless simulator.
//!
//! Runs quests and crafts over the built-in demo catalog without any UI,
//! printing a summary for balance checks. Time is simulated: deadlines
//! are warped past instead of waited on.
//!
//! Usage:
//!   cargo run --bin simulator -- [OPTIONS]
//!
//! Options:
//!   --seed N      RNG seed (default: 42)
//!   --quests N    Quests to run (default: 10)
//!   --crafts N    Crafts to run (default: 5)
//!   --quiet       Only the final summary line

use deckforge::cards::quality_rank;
use deckforge::catalog;
use deckforge::context::GameContext;
use deckforge::crafting::{CraftKind, Crafter};
use deckforge::quest::{resolve_quest, start_quest};
use deckforge::records::save_context;
use deckforge::store::MemoryStore;
use rand::rngs::StdRng;
use rand::SeedableRng;

struct SimConfig {
    seed: u64,
    quests: u32,
    crafts: u32,
    quiet: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            quests: 10,
            crafts: 5,
            quiet: false,
        }
    }
}

fn parse_args() -> SimConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = SimConfig::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                i += 1;
                config.seed = args[i].parse().expect("--seed requires a number");
            }
            "--quests" => {
                i += 1;
                config.quests = args[i].parse().expect("--quests requires a number");
            }
            "--crafts" => {
                i += 1;
                config.crafts = args[i].parse().expect("--crafts requires a number");
            }
            "--quiet" => config.quiet = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }
    config
}

fn print_usage() {
    eprintln!(
        "Deckforge Headless Simulator\n\
         \n\
         Usage: simulator [OPTIONS]\n\
         \n\
         Options:\n\
         \x20 --seed N      RNG seed (default: 42)\n\
         \x20 --quests N    Quests to run (default: 10)\n\
         \x20 --crafts N    Crafts to run (default: 5)\n\
         \x20 --quiet       Only the final summary line\n\
         \x20 --help, -h    Show this help"
    );
}

fn main() {
    let config = parse_args();
    let catalog = catalog::demo();
    let mut store = MemoryStore::new();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut now_ms: i64 = 0;

    let mut context = GameContext::new();
    let hero_guid = match context.hire_hero("Mr Knight") {
        Some(hero) => hero.guid,
        None => {
            eprintln!("Not enough gold to hire a hero");
            std::process::exit(1);
        }
    };
    context
        .crafters
        .push(Crafter::new(0, "Action Crafter", CraftKind::Action));
    context
        .crafters
        .push(Crafter::new(1, "Equipment Crafter", CraftKind::Equipment));

    // ── Quests ───────────────────────────────────────────────────────
    let mut wins = 0u32;
    let mut losses = 0u32;
    let mut total_score = 0.0;
    let template = catalog.location(1).expect("demo location").clone();
    for quest_index in 0..config.quests {
        let hero = context
            .hero_by_guid_mut(hero_guid)
            .expect("hero exists");
        let Some((report, _)) =
            start_quest(&template, hero, &catalog, now_ms, &mut rng, &mut store)
        else {
            continue;
        };

        // Warp past the deadline and resolve.
        now_ms += template.duration_secs as i64 * 1000;
        let hero = context
            .hero_by_guid_mut(hero_guid)
            .expect("hero exists");
        let outcome = resolve_quest(&template, hero, &catalog, now_ms, &mut rng, &mut store)
            .expect("quest was due");

        if outcome.score < 0.0 {
            losses += 1;
        } else {
            wins += 1;
            total_score += outcome.score;
        }
        let rewards = outcome.rewards.clone();
        context.grant_quest_rewards(&outcome, &catalog);

        if !config.quiet {
            println!(
                "quest {:>3}: score {:>5.2} rounds {:>2} rewards {:?}",
                quest_index + 1,
                outcome.score,
                report.rounds,
                rewards
            );
        }
    }

    // ── Crafting ─────────────────────────────────────────────────────
    let mut crafted = 0u32;
    for _ in 0..config.crafts {
        // Stock exactly one Mend recipe and run it through slot 0.
        context.add_material(1001, 1, &catalog);
        context.add_material(1003, 1, &catalog);
        if !context.load_material(0, 0, 1001, &catalog)
            || !context.load_material(0, 0, 1003, &catalog)
        {
            context.cancel_craft_setup(0, 0, &catalog);
            continue;
        }

        let Some(craft) = context
            .crafter_mut(0)
            .and_then(|crafter| crafter.start_craft(0, now_ms, &catalog, &mut rng, &mut store))
        else {
            continue;
        };

        now_ms = craft.end_ms;
        let (collected, _) = context.collect_craft(0, 0, now_ms, &catalog, &mut store);
        if let Some(guid) = collected {
            crafted += 1;
            if !config.quiet {
                let card = context.card_by_guid(guid).expect("collected card");
                println!(
                    "craft {:>3}: {} quality {:>6.2} rank {}",
                    crafted,
                    card.info().name,
                    card.info().quality,
                    quality_rank(card.info().quality)
                );
            }
        }
    }

    save_context(&context, &mut store);

    let hero = context.hero_by_guid(hero_guid).expect("hero exists");
    let crafter_level = context.crafters[0].progress.level;
    let mastery = context.crafters[0].crafting_count(2001).unwrap_or(0);
    println!(
        "seed {} | quests {} (won {} lost {}) avg score {:.2} | hero lvl {} | crafts {} crafter lvl {} mastery {} | records {}",
        config.seed,
        config.quests,
        wins,
        losses,
        if wins > 0 { total_score / wins as f64 } else { 0.0 },
        hero.level(),
        crafted,
        crafter_level,
        mastery,
        store.len()
    );
}
