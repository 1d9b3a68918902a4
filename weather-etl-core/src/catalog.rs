//! Fixed catalog of query targets: the capital cities of Asia.

use crate::model::CityQuery;

/// `(name, latitude, longitude)` for every capital in the catalog.
pub const ASIAN_CAPITALS: &[(&str, f64, f64)] = &[
    ("Kabul", 34.52, 69.17),
    ("Yerevan", 40.17, 44.50),
    ("Baku", 40.38, 49.89),
    ("Manama", 26.22, 50.58),
    ("Dhaka", 23.71, 90.41),
    ("Thimphu", 27.47, 89.63),
    ("Bandar Seri Begawan", 4.89, 114.94),
    ("Phnom Penh", 11.55, 104.92),
    ("Beijing", 39.91, 116.40),
    ("Nicosia", 35.17, 33.37),
    ("Tbilisi", 41.72, 44.78),
    ("New Delhi", 28.61, 77.21),
    ("Jakarta", -6.20, 106.82),
    ("Tehran", 35.69, 51.39),
    ("Baghdad", 33.34, 44.39),
    ("Jerusalem", 31.77, 35.22),
    ("Tokyo", 35.69, 139.69),
    ("Amman", 31.95, 35.93),
    ("Nur-Sultan", 51.17, 71.43),
    ("Kuwait City", 29.37, 47.98),
    ("Bishkek", 42.87, 74.60),
    ("Vientiane", 17.97, 102.61),
    ("Beirut", 33.89, 35.50),
    ("Kuala Lumpur", 3.14, 101.69),
    ("Malé", 4.17, 73.51),
    ("Ulaanbaatar", 47.92, 106.92),
    ("Naypyidaw", 19.76, 96.08),
    ("Kathmandu", 27.72, 85.32),
    ("Pyongyang", 39.03, 125.75),
    ("Muscat", 23.61, 58.59),
    ("Islamabad", 33.72, 73.04),
    ("Ramallah", 31.90, 35.20),
    ("Manila", 14.60, 120.98),
    ("Doha", 25.29, 51.53),
    ("Moscow", 55.75, 37.62),
    ("Riyadh", 24.71, 46.68),
    ("Singapore", 1.35, 103.82),
    ("Seoul", 37.57, 126.98),
    ("Sri Jayawardenepura Kotte", 6.93, 79.86),
    ("Damascus", 33.51, 36.31),
    ("Taipei", 25.03, 121.57),
    ("Dushanbe", 38.56, 68.77),
    ("Bangkok", 13.75, 100.50),
    ("Dili", -8.56, 125.57),
    ("Ankara", 39.93, 32.86),
    ("Ashgabat", 37.95, 58.38),
    ("Abu Dhabi", 24.45, 54.38),
    ("Tashkent", 41.29, 69.24),
    ("Hanoi", 21.03, 105.85),
    ("Sana'a", 15.37, 44.21),
];

/// The catalog as owned queries, in declaration order.
pub fn asian_capitals() -> Vec<CityQuery> {
    ASIAN_CAPITALS
        .iter()
        .map(|&(name, lat, lon)| CityQuery::new(name, lat, lon))
        .collect()
}

/// Case-insensitive lookup by city name.
pub fn find_city(name: &str) -> Option<CityQuery> {
    ASIAN_CAPITALS
        .iter()
        .find(|(candidate, _, _)| candidate.eq_ignore_ascii_case(name.trim()))
        .map(|&(name, lat, lon)| CityQuery::new(name, lat, lon))
}
