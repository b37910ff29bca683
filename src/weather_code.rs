//! JMA three-digit weather codes and their Japanese descriptions.

/// Description used for codes missing from [`WEATHER_CODES`].
pub const UNKNOWN_WEATHER: &str = "不明な天気";

/// Compiled-in code table, sorted by code.
pub const WEATHER_CODES: &[(&str, &str)] = &[
    ("100", "晴れ"),
    ("101", "晴れ 時々 曇り"),
    ("102", "晴れ 時々 雨"),
    ("104", "晴れ 時々 雪"),
    ("110", "晴れ 後 曇り"),
    ("112", "晴れ 後 雨"),
    ("115", "晴れ 後 雪"),
    ("200", "曇り"),
    ("201", "曇り 時々 晴れ"),
    ("202", "曇り 時々 雨"),
    ("204", "曇り 時々 雪"),
    ("210", "曇り 後 晴れ"),
    ("212", "曇り 後 雨"),
    ("215", "曇り 後 雪"),
    ("300", "雨"),
    ("301", "雨 時々 晴れ"),
    ("302", "雨 時々 曇り"),
    ("303", "雨 時々 雪"),
    ("308", "大雨"),
    ("311", "雨 後 晴れ"),
    ("313", "雨 後 曇り"),
    ("314", "雨 後 雪"),
    ("400", "雪"),
    ("401", "雪 時々 晴れ"),
    ("402", "雪 時々 曇り"),
    ("403", "雪 時々 雨"),
    ("406", "大雪"),
    ("411", "雪 後 晴れ"),
    ("413", "雪 後 曇り"),
    ("414", "雪 後 雨"),
];

/// Look up a code, `None` if the table does not know it.
#[must_use]
pub fn describe(code: &str) -> Option<&'static str> {
    WEATHER_CODES
        .binary_search_by(|(c, _)| (*c).cmp(code))
        .ok()
        .map(|i| WEATHER_CODES[i].1)
}

/// Translate a code, falling back to [`UNKNOWN_WEATHER`].
#[must_use]
pub fn translate(code: &str) -> &'static str {
    describe(code).unwrap_or(UNKNOWN_WEATHER)
}
