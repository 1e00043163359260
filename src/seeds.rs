//! Seed knowledge shipped with the game.
//!
//! Five generation-0 entries, one per themed category, written as plausible
//! encyclopedia articles about things that do not exist. They are the roots
//! every lineage grows from and the only rows the store creates on its own.

use rand::Rng;

use crate::db::{Category, Knowledge};

const SEED_CREATED_AT: &str = "2025-01-01T00:00:00Z";
const SEED_CREATED_BY: &str = "system";

fn seed(id: &str, title: &str, category: Category, description: &str) -> Knowledge {
    Knowledge {
        id: id.to_string(),
        title: title.to_string(),
        category,
        description: description.to_string(),
        parent_id: None,
        generation: 0,
        created_at: SEED_CREATED_AT.to_string(),
        created_by: SEED_CREATED_BY.to_string(),
        chat_log: Vec::new(),
        times_shown: 0,
        children_count: 0,
    }
}

/// The fixed seed set, in id order.
pub fn seed_knowledge() -> Vec<Knowledge> {
    vec![
        seed(
            "seed-001",
            "The Chronoflux Phenomenon",
            Category::Science,
            "Chronoflux is the name given to a localized unevenness in the flow of time that \
arises under specific laboratory conditions.\n\n\
It was discovered by accident in 1987, when the Swiss physicist Hans Müller noticed anomalous \
timing residues during a high-energy particle collision experiment. The effect has since become \
an active topic in theoretical physics.\n\n\
Inside a chronoflux region, time runs fractionally faster or slower than outside it, with the \
difference measured in nanoseconds. The phenomenon has never been observed in nature and can \
only be reproduced in controlled laboratory environments.\n\n\
A minority of researchers argue that chronoflux could form the theoretical basis for time \
travel, though the mainstream position remains firmly skeptical.",
        ),
        seed(
            "seed-002",
            "Silent Harmony",
            Category::Art,
            "Silent Harmony was a musical form fashionable in late eighteenth-century Europe, \
distinguished by performances in which the musicians played their instruments without producing \
any sound at all.\n\n\
The form was devised in Vienna in 1783 by the composer Johann Stille. Audiences were expected \
to imagine the music from the players' movements and expressions alone, and the ability to do \
so convincingly was treated in aristocratic circles as proof of refined musical education.\n\n\
The heart of a Silent Harmony concert was that every listener imagined a different piece. \
Debating afterwards what each person had 'heard' became a social ritual in its own right.\n\n\
The form declined with the rise of Romantic music in the early nineteenth century, but it has \
recently been revisited by the contemporary art world as an early species of performance art.",
        ),
        seed(
            "seed-003",
            "Luminescent Moss",
            Category::Nature,
            "Luminescent moss (Bryophyta lucens) is a rare species of moss that produces its own \
light in darkness.\n\n\
It is found chiefly in the deep caves and abandoned mines of northern Europe, where it gives \
off a faint teal glow through bioluminescence. Rather than photosynthesizing, the moss is \
believed to draw its energy from minerals absorbed out of cave walls.\n\n\
Medieval miners called it the 'fairy's lantern' and held that a vein of pure gold ran wherever \
the moss grew. Because the species really does grow only under particular mineral conditions, \
it saw genuine use as a prospecting indicator.\n\n\
Its habitat has contracted sharply under climate change, and the species is now listed as \
Vulnerable on the IUCN Red List.",
        ),
        seed(
            "seed-004",
            "Echo Mnemonics",
            Category::Philosophy,
            "Echo mnemonics is a memory technique originating in ancient Greece, in which the \
material to be remembered is bound to a particular sound or rhythm.\n\n\
It is traditionally credited to the philosopher Echomenes, who systematized it around the \
fourth century BC on the claim that human memory takes a deeper imprint from hearing than from \
sight. The method assigns each piece of information its own 'acoustic signature'; recalling the \
sound recalls the memory attached to it.\n\n\
Modern neuroscience has reported that the practice strengthens connections between the auditory \
cortex and the hippocampus, with musicians and linguists showing the strongest gains.\n\n\
The underlying principle has lately been adapted into 'soundscape learning', an approach \
attracting attention in foreign-language education.",
        ),
        seed(
            "seed-005",
            "The Treaty of Cartographia",
            Category::History,
            "The Treaty of Cartographia was an international accord concluded in Amsterdam in \
1652, and the first in the world to regulate the standardization of maps.\n\n\
During the seventeenth-century age of sail, disagreements between the charts produced by \
different nations were a constant source of territorial disputes and shipwrecks. \
Representatives of seven European states therefore met to agree on a unified standard for \
mapmaking.\n\n\
The treaty's main provisions covered the placement of the prime meridian, the notation of \
scale, and methods for measuring coastlines. Notably, it introduced a standard symbol for \
unexplored regions, formally banning the imaginary monsters and mythical decorations that maps \
had carried until then.\n\n\
The treaty became the ancestor of modern international mapping standards and is inscribed in \
the UNESCO Memory of the World register.",
        ),
    ]
}

/// Pick a random seed for a new round. A category narrows the pool; a
/// category with no seeds falls back to the whole set rather than failing
/// the round.
pub fn random_seed(seeds: &[Knowledge], category: Option<Category>) -> Option<&Knowledge> {
    if seeds.is_empty() {
        return None;
    }
    let filtered: Vec<&Knowledge> = match category {
        Some(cat) => seeds.iter().filter(|k| k.category == cat).collect(),
        None => seeds.iter().collect(),
    };
    let pool = if filtered.is_empty() {
        seeds.iter().collect::<Vec<_>>()
    } else {
        filtered
    };
    let idx = rand::thread_rng().gen_range(0..pool.len());
    Some(pool[idx])
}
