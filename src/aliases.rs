const LEAGUE_ALIASES: &[(&str, &str)] = &[
    ("epl", "premier_league"),
    ("pl", "premier_league"),
    ("english_premier_league", "premier_league"),
    ("prem", "premier_league"),
    ("england", "premier_league"),
    ("ucl", "champions_league"),
    ("cl", "champions_league"),
    ("uefa_champions_league", "champions_league"),
    ("champions", "champions_league"),
];

const TEAM_ALIASES: &[(&str, &str)] = &[
    ("manchester_united", "man_utd"),
    ("manchester_utd", "man_utd"),
    ("united", "man_utd"),
    ("mufc", "man_utd"),
    ("manchester_city", "man_city"),
    ("city", "man_city"),
    ("mcfc", "man_city"),
    ("nottingham_forest", "nottm_forest"),
    ("forest", "nottm_forest"),
    ("tottenham_hotspur", "tottenham"),
    ("spurs", "tottenham"),
    ("west_ham_united", "west_ham"),
    ("wolverhampton", "wolves"),
    ("brighton_hove_albion", "brighton"),
    ("newcastle_united", "newcastle"),
    ("palace", "crystal_palace"),
    ("gunners", "arsenal"),
    ("reds", "liverpool"),
    ("blues", "chelsea"),
    ("villa", "aston_villa"),
    ("real", "real_madrid"),
    ("barca", "barcelona"),
    ("bayern_munich", "bayern"),
    ("borussia_dortmund", "dortmund"),
    ("inter_milan", "inter"),
    ("paris_saint_germain", "psg"),
];

/// Lower-cases the input and joins whitespace-separated words with `_`.
pub fn slugify(input: &str) -> String {
    input
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

pub fn normalize_league(input: &str) -> String {
    resolve(LEAGUE_ALIASES, slugify(input))
}

pub fn normalize_team_name(input: &str) -> String {
    resolve(TEAM_ALIASES, slugify(input))
}

/// Unknown names pass through in slug form; the tables only override.
fn resolve(table: &[(&str, &str)], slug: String) -> String {
    table
        .iter()
        .find(|(alias, _)| *alias == slug)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(slug)
}
