use rand::Rng;
use rand::RngCore;

use crate::model::Gender;

const MALE_NAMES: &[&str] = &[
    "Aldric", "Bertram", "Conrad", "Diederik", "Edmund", "Florian", "Godfrey", "Henrik",
    "Ingram", "Jacopo", "Konrad", "Lorenzo", "Matthias", "Niccolo", "Oswin", "Piers",
    "Reinhold", "Sigmund", "Tobias", "Ulrich", "Wendel",
];

const FEMALE_NAMES: &[&str] = &[
    "Adelheid", "Beatrix", "Cecily", "Dorothea", "Elsbeth", "Felicitas", "Gisela", "Hedwig",
    "Isolde", "Johanna", "Katrin", "Lucia", "Margarethe", "Notburga", "Ottilie", "Petronella",
    "Rosalind", "Sibylla", "Theda", "Ursula", "Walburga",
];

const SURNAMES: &[&str] = &[
    "Ackermann", "Bauer", "Brandt", "Fischer", "Gerber", "Hartmann", "Jaeger", "Keller",
    "Lang", "Meyer", "Neumann", "Richter", "Schmid", "Vogel", "Wagner", "Weber", "Zimmer",
];

/// Generate a random given name for the gender.
pub fn generate_given_name(gender: Gender, rng: &mut dyn RngCore) -> &'static str {
    let pool = match gender {
        Gender::Male => MALE_NAMES,
        Gender::Female => FEMALE_NAMES,
    };
    pool[rng.random_range(0..pool.len())]
}

pub fn generate_surname(rng: &mut dyn RngCore) -> &'static str {
    SURNAMES[rng.random_range(0..SURNAMES.len())]
}
