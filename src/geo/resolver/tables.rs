pub(super) const NAME_OVERRIDES: &[(&str, &str)] = &[
    ("France", "FRA"),
    ("Norway", "NOR"),
    ("Kosovo", "XKX"),
    ("Somaliland", "SOL"),
    ("N. Cyprus", "CYN"),
    ("Northern Cyprus", "CYN"),
    ("Taiwan", "TWN"),
    ("W. Sahara", "ESH"),
    ("Western Sahara", "ESH"),
    ("Palestine", "PSE"),
];

pub(super) const MULTI_TERRITORY_CODES: &[(&str, &[&str])] = &[
    ("FRA", &["France"]),
    ("NOR", &["Norway"]),
    ("NLD", &["Netherlands"]),
    ("GBR", &["United Kingdom"]),
    ("DNK", &["Denmark"]),
    ("USA", &["United States of America", "United States"]),
    ("AUS", &["Australia"]),
    ("NZL", &["New Zealand"]),
];

/// ISO 3166-1 numeric to alpha-3, limited to countries the relationship
/// dataset references.
pub(super) const NUMERIC_TO_ALPHA3: &[(u16, &str)] = &[
    (4, "AFG"),
    (8, "ALB"),
    (12, "DZA"),
    (24, "AGO"),
    (32, "ARG"),
    (36, "AUS"),
    (40, "AUT"),
    (50, "BGD"),
    (56, "BEL"),
    (76, "BRA"),
    (104, "MMR"),
    (112, "BLR"),
    (124, "CAN"),
    (152, "CHL"),
    (156, "CHN"),
    (158, "TWN"),
    (170, "COL"),
    (180, "COD"),
    (191, "HRV"),
    (192, "CUB"),
    (196, "CYP"),
    (203, "CZE"),
    (208, "DNK"),
    (231, "ETH"),
    (246, "FIN"),
    (250, "FRA"),
    (268, "GEO"),
    (276, "DEU"),
    (288, "GHA"),
    (300, "GRC"),
    (348, "HUN"),
    (356, "IND"),
    (360, "IDN"),
    (364, "IRN"),
    (368, "IRQ"),
    (372, "IRL"),
    (376, "ISR"),
    (380, "ITA"),
    (392, "JPN"),
    (398, "KAZ"),
    (400, "JOR"),
    (404, "KEN"),
    (408, "PRK"),
    (410, "KOR"),
    (414, "KWT"),
    (422, "LBN"),
    (434, "LBY"),
    (458, "MYS"),
    (484, "MEX"),
    (496, "MNG"),
    (504, "MAR"),
    (524, "NPL"),
    (528, "NLD"),
    (554, "NZL"),
    (566, "NGA"),
    (578, "NOR"),
    (586, "PAK"),
    (604, "PER"),
    (608, "PHL"),
    (616, "POL"),
    (620, "PRT"),
    (634, "QAT"),
    (642, "ROU"),
    (643, "RUS"),
    (682, "SAU"),
    (688, "SRB"),
    (702, "SGP"),
    (704, "VNM"),
    (710, "ZAF"),
    (724, "ESP"),
    (729, "SDN"),
    (752, "SWE"),
    (756, "CHE"),
    (760, "SYR"),
    (764, "THA"),
    (784, "ARE"),
    (792, "TUR"),
    (804, "UKR"),
    (818, "EGY"),
    (826, "GBR"),
    (840, "USA"),
    (858, "URY"),
    (860, "UZB"),
    (862, "VEN"),
    (887, "YEM"),
];

pub(super) const CANONICAL_NAMES: &[(&str, &str)] = &[
    ("AFG", "Afghanistan"),
    ("ARE", "United Arab Emirates"),
    ("ARG", "Argentina"),
    ("AUS", "Australia"),
    ("BIH", "Bosnia and Herzegovina"),
    ("BRA", "Brazil"),
    ("CAF", "Central African Republic"),
    ("CAN", "Canada"),
    ("CHN", "China"),
    ("CIV", "Cote d'Ivoire"),
    ("COD", "Democratic Republic of the Congo"),
    ("COG", "Republic of the Congo"),
    ("CZE", "Czechia"),
    ("DEU", "Germany"),
    ("DOM", "Dominican Republic"),
    ("EGY", "Egypt"),
    ("ESP", "Spain"),
    ("FRA", "France"),
    ("GBR", "United Kingdom"),
    ("GNQ", "Equatorial Guinea"),
    ("IND", "India"),
    ("IRN", "Iran"),
    ("ISR", "Israel"),
    ("JPN", "Japan"),
    ("KOR", "South Korea"),
    ("LAO", "Laos"),
    ("MKD", "North Macedonia"),
    ("NER", "Niger"),
    ("NGA", "Nigeria"),
    ("PRK", "North Korea"),
    ("RUS", "Russia"),
    ("SAU", "Saudi Arabia"),
    ("SLB", "Solomon Islands"),
    ("SSD", "South Sudan"),
    ("SWZ", "Eswatini"),
    ("SYR", "Syria"),
    ("TUR", "Turkey"),
    ("TWN", "Taiwan"),
    ("TZA", "Tanzania"),
    ("UKR", "Ukraine"),
    ("USA", "United States of America"),
    ("VEN", "Venezuela"),
    ("VNM", "Vietnam"),
];
