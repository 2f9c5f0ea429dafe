/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// NCIC CODE TABLES
// =============================================================================

/// NCIC eye colour codes and their labels
pub const EYE_COLORS: &[(&str, &str)] = &[
    ("BLK", "Black"),
    ("BRO", "Brown"),
    ("GRN", "Green"),
    ("MAR", "Maroon"),
    ("PNK", "Pink"),
    ("BLU", "Blue"),
    ("GRY", "Gray"),
    ("HAZ", "Hazel"),
    ("MUL", "Multicolored"),
    ("XXX", "Unknown"),
];

/// NCIC hair colour codes and their labels
pub const HAIR_COLORS: &[(&str, &str)] = &[
    ("BLD", "Bald"),
    ("BLK", "Black"),
    ("BLN", "Blond or Strawberry"),
    ("BLU", "Blue"),
    ("BRO", "Brown"),
    ("GRY", "Gray or Partially Gray"),
    ("GRN", "Green"),
    ("ONG", "Orange"),
    ("PNK", "Pink"),
    ("PLE", "Purple"),
    ("RED", "Red or Auburn"),
    ("SDY", "Sandy"),
    ("WHI", "White"),
    ("XXX", "Unknown or Completely Bald"),
];

/// US states and territories, matching the seeded `states` table
pub const STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AS", "American Samoa"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District Of Columbia"),
    ("FM", "Federated States Of Micronesia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("GU", "Guam"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MH", "Marshall Islands"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("MP", "Northern Mariana Islands"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PW", "Palau"),
    ("PA", "Pennsylvania"),
    ("PR", "Puerto Rico"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VI", "Virgin Islands"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// Returns true when `code` is the first element of one of `table`'s pairs
pub fn is_known_code(table: &[(&str, &str)], code: &str) -> bool {
    table.iter().any(|(c, _)| *c == code)
}
