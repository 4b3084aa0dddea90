/// Column name constants for the catalog CSV
/// These keep the loader, normalizer and aggregations pointed at the same headers

pub const ID_COLUMN: &str = "show_id";
pub const TYPE_COLUMN: &str = "type";
pub const TITLE_COLUMN: &str = "title";
pub const DIRECTOR_COLUMN: &str = "director";
pub const CAST_COLUMN: &str = "cast";
pub const COUNTRY_COLUMN: &str = "country";
pub const DATE_ADDED_COLUMN: &str = "date_added";
pub const RELEASE_YEAR_COLUMN: &str = "release_year";
pub const RATING_COLUMN: &str = "rating";
pub const DURATION_COLUMN: &str = "duration";
pub const CATEGORY_COLUMN: &str = "listed_in";
pub const DESCRIPTION_COLUMN: &str = "description";

/// Every column the loader insists on, in file order
pub const REQUIRED_COLUMNS: [&str; 12] = [
    ID_COLUMN,
    TYPE_COLUMN,
    TITLE_COLUMN,
    DIRECTOR_COLUMN,
    CAST_COLUMN,
    COUNTRY_COLUMN,
    DATE_ADDED_COLUMN,
    RELEASE_YEAR_COLUMN,
    RATING_COLUMN,
    DURATION_COLUMN,
    CATEGORY_COLUMN,
    DESCRIPTION_COLUMN,
];

/// Columns holding comma-packed lists in the raw file
pub const MULTIVALUE_COLUMNS: [&str; 4] = [
    DIRECTOR_COLUMN,
    CAST_COLUMN,
    COUNTRY_COLUMN,
    CATEGORY_COLUMN,
];

pub const DEFAULT_SEPARATOR: &str = ",";

// Sentinels substituted for missing values
pub const COUNTRY_SENTINEL: &str = "None";
pub const PEOPLE_SENTINEL: &str = "no data";

pub const MOVIE_KIND: &str = "Movie";
pub const TV_SHOW_KIND: &str = "TV Show";

/// Durations that were typed into the rating column upstream
pub const CORRUPT_RATINGS: [&str; 3] = ["66 min", "74 min", "84 min"];

/// Format of `date_added`, e.g. "September 9, 2019"
pub const DATE_ADDED_FORMAT: &str = "%B %d, %Y";

// Movie duration histogram: edges 0, 10, ..., 190
pub const DURATION_BIN_START: i64 = 0;
pub const DURATION_BIN_STOP: i64 = 200;
pub const DURATION_BIN_STEP: i64 = 10;
