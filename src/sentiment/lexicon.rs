//! Word valences, booster weights and negation cues for the lexical scorer.
//!
//! Valences are on a -4..4 scale. Only lowercase entries are stored.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

const VALENCES: &[(&str, f64)] = &[
    // positive
    ("love", 3.2),
    ("loved", 2.9),
    ("loves", 2.7),
    ("lovely", 2.8),
    ("adore", 2.9),
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("excellent", 2.7),
    ("fantastic", 2.6),
    ("wonderful", 2.7),
    ("great", 3.1),
    ("good", 1.9),
    ("nice", 1.8),
    ("cool", 1.3),
    ("fun", 2.3),
    ("funny", 1.9),
    ("happy", 2.7),
    ("glad", 2.0),
    ("excited", 1.4),
    ("exciting", 2.2),
    ("yay", 2.4),
    ("haha", 1.6),
    ("hahaha", 1.8),
    ("lol", 1.8),
    ("lmao", 2.0),
    ("thanks", 1.9),
    ("thank", 1.5),
    ("grateful", 2.0),
    ("congrats", 2.4),
    ("congratulations", 2.9),
    ("proud", 2.1),
    ("beautiful", 2.9),
    ("cute", 2.0),
    ("sweet", 2.0),
    ("perfect", 2.7),
    ("best", 3.2),
    ("better", 1.9),
    ("enjoy", 2.2),
    ("enjoyed", 2.3),
    ("miss", 0.4),
    ("hug", 2.1),
    ("hugs", 2.2),
    ("kiss", 1.8),
    ("like", 2.0),
    ("liked", 1.8),
    ("okay", 0.9),
    ("ok", 0.9),
    ("yes", 1.7),
    ("wow", 2.8),
    ("win", 2.8),
    ("won", 2.7),
    ("safe", 1.9),
    ("relaxed", 2.2),
    ("brilliant", 2.8),
    ("delicious", 2.7),
    ("incredible", 2.2),
    ("hope", 1.9),
    ("smile", 1.5),
    ("laugh", 2.6),
    // negative
    ("hate", -2.7),
    ("hated", -3.2),
    ("awful", -2.0),
    ("terrible", -2.1),
    ("horrible", -2.5),
    ("worst", -3.1),
    ("bad", -2.5),
    ("worse", -2.1),
    ("sad", -2.1),
    ("upset", -1.6),
    ("angry", -2.3),
    ("mad", -2.2),
    ("annoyed", -1.6),
    ("annoying", -1.7),
    ("sorry", -0.3),
    ("sick", -1.7),
    ("tired", -1.9),
    ("hurt", -2.4),
    ("cry", -2.1),
    ("crying", -2.1),
    ("ugh", -1.8),
    ("damn", -1.7),
    ("stupid", -2.4),
    ("boring", -1.3),
    ("bored", -1.1),
    ("lonely", -2.0),
    ("scared", -1.9),
    ("afraid", -2.0),
    ("worried", -1.2),
    ("stress", -1.8),
    ("stressed", -1.4),
    ("fail", -2.5),
    ("failed", -2.3),
    ("lost", -1.3),
    ("broke", -1.8),
    ("broken", -2.1),
    ("problem", -1.7),
    ("wrong", -2.1),
    ("sucks", -1.5),
    ("disappointed", -1.9),
    ("disgusting", -2.4),
    ("pain", -2.3),
    ("late", -0.8),
    ("ruined", -2.4),
];

const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", 0.293),
    ("completely", 0.293),
    ("extremely", 0.293),
    ("incredibly", 0.293),
    ("really", 0.293),
    ("so", 0.293),
    ("super", 0.293),
    ("totally", 0.293),
    ("very", 0.293),
    ("most", 0.293),
    ("soooo", 0.293),
    ("hella", 0.293),
    ("barely", -0.293),
    ("hardly", -0.293),
    ("kinda", -0.293),
    ("kind", -0.293),
    ("slightly", -0.293),
    ("somewhat", -0.293),
    ("sort", -0.293),
    ("little", -0.293),
];

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "neither", "nor", "without", "cannot",
    "can't", "cant", "don't", "dont", "doesn't", "doesnt", "didn't", "didnt", "isn't", "isnt",
    "aren't", "arent", "wasn't", "wasnt", "weren't", "werent", "won't", "wont", "wouldn't",
    "wouldnt", "shouldn't", "shouldnt", "couldn't", "couldnt", "haven't", "havent", "hasn't",
    "hasnt", "ain't", "aint",
];

/// Default valence table
pub static LEXICON: Lazy<HashMap<&'static str, f64>> =
    Lazy::new(|| VALENCES.iter().copied().collect());

/// Additive modifiers applied to the word that follows a booster
pub static BOOSTER_WORDS: Lazy<HashMap<&'static str, f64>> =
    Lazy::new(|| BOOSTERS.iter().copied().collect());

/// Tokens that open a negation window
pub static NEGATIONS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| NEGATION_WORDS.iter().copied().collect());
