//! Messages sent to the extraction service

/// Instructions every session is seeded with, in order
pub const SEED_INSTRUCTIONS: [&str; 7] = [
    "Do not wrap JSON code in JSON markers. \
     When mapping to a JSON string, only return the object itself.",
    "The allwhere asset data standard is described in the file named \
     \"H5-Proposal_ Asset Data Standard-260624-155652\". \
     DO NOT ASSUME VALUES FOR FIELDS THAT ARE NOT PRESENT.",
    "When mapping to the fields of the asset data standard, \
     it's possible that only the model number field is present",
    "When mapping to the fields of the asset data standard, \
     if the provided string includes the word \"case\", \
     it refers to a device case and not a device itself",
    "When mapping to the fields of the asset data standard, \
     the model number is often found before or after \
     the display size of the input string",
    "When mapping to the fields of the asset data standard, \
     do not include \"Apple\" for M series processors",
    "The file named \"Make Whitelist\" contains a list of valid make values. \
     These are the most common makes, but there may be others not listed.",
];

const QUERY_PREFIX: &str = "Map the following line of text into a JSON string \
with the color, display size, keyboard, make, model, memory, model number, \
operating system, processor, processor frequency, storage, \
and storage type fields defined in the allwhere asset data standard: ";

/// Seed messages as owned strings
pub fn seed_messages() -> Vec<String> {
    SEED_INSTRUCTIONS.iter().map(|s| s.to_string()).collect()
}

/// The per-asset query
pub fn query_prompt(input: &str) -> String {
    format!("{}{}", QUERY_PREFIX, input)
}
