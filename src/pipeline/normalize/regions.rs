use crate::types::RegionKey;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A canonical oblast-level region and every spelling sources use for it
#[derive(Debug)]
pub struct RegionDef {
    pub key: &'static str,
    pub display_name: &'static str,
    /// Lowercase aliases (Ukrainian, Russian, Latin transliterations)
    pub aliases: &'static [&'static str],
}

pub static REGIONS: &[RegionDef] = &[
    RegionDef {
        key: "kyiv",
        display_name: "Київ та область",
        aliases: &[
            "київ", "киев", "kyiv", "kiev", "м. київ", "м.київ", "г. киев", "київська",
            "киевская", "kyivska", "kyiv city", "київ та область",
        ],
    },
    RegionDef {
        key: "lviv",
        display_name: "Львівська область",
        aliases: &["львів", "львов", "lviv", "lvov", "львівська", "львовская", "lvivska"],
    },
    RegionDef {
        key: "kharkiv",
        display_name: "Харківська область",
        aliases: &[
            "харків", "харьков", "kharkiv", "kharkov", "харківська", "харьковская", "kharkivska",
        ],
    },
    RegionDef {
        key: "odesa",
        display_name: "Одеська область",
        aliases: &["одеса", "одесса", "odesa", "odessa", "одеська", "одесская", "odeska"],
    },
    RegionDef {
        key: "dnipro",
        display_name: "Дніпропетровська область",
        aliases: &[
            "дніпро", "днепр", "dnipro", "dnepr", "дніпропетровська", "днепропетровская",
            "dnipropetrovska", "dnipropetrovsk",
        ],
    },
    RegionDef {
        key: "donetsk",
        display_name: "Донецька область",
        aliases: &["донецьк", "донецк", "donetsk", "донецька", "донецкая", "donetska"],
    },
    RegionDef {
        key: "zaporizhzhia",
        display_name: "Запорізька область",
        aliases: &[
            "запоріжжя", "запорожье", "zaporizhzhia", "zaporozhye", "запорізька", "запорожская",
            "zaporizka",
        ],
    },
    RegionDef {
        key: "vinnytsia",
        display_name: "Вінницька область",
        aliases: &["вінниця", "винница", "vinnytsia", "vinnitsa", "вінницька", "винницкая", "vinnytska"],
    },
    RegionDef {
        key: "zhytomyr",
        display_name: "Житомирська область",
        aliases: &["житомир", "zhytomyr", "zhitomir", "житомирська", "житомирская", "zhytomyrska"],
    },
    RegionDef {
        key: "poltava",
        display_name: "Полтавська область",
        aliases: &["полтава", "poltava", "полтавська", "полтавская", "poltavska"],
    },
    RegionDef {
        key: "cherkasy",
        display_name: "Черкаська область",
        aliases: &["черкаси", "черкассы", "cherkasy", "cherkassy", "черкаська", "черкасская", "cherkaska"],
    },
    RegionDef {
        key: "chernihiv",
        display_name: "Чернігівська область",
        aliases: &[
            "чернігів", "чернигов", "chernihiv", "chernigov", "чернігівська", "черниговская",
            "chernihivska",
        ],
    },
    RegionDef {
        key: "sumy",
        display_name: "Сумська область",
        aliases: &["суми", "сумы", "sumy", "сумська", "сумская", "sumska"],
    },
    RegionDef {
        key: "rivne",
        display_name: "Рівненська область",
        aliases: &["рівне", "ровно", "rivne", "rovno", "рівненська", "ровенская", "rivnenska"],
    },
    RegionDef {
        key: "khmelnytskyi",
        display_name: "Хмельницька область",
        aliases: &[
            "хмельницький", "хмельницкий", "khmelnytskyi", "khmelnitsky", "хмельницька",
            "хмельницкая", "khmelnytska",
        ],
    },
    RegionDef {
        key: "ternopil",
        display_name: "Тернопільська область",
        aliases: &[
            "тернопіль", "тернополь", "ternopil", "ternopol", "тернопільська", "тернопольская",
            "ternopilska",
        ],
    },
    RegionDef {
        key: "ivano-frankivsk",
        display_name: "Івано-Франківська область",
        aliases: &[
            "івано-франківськ", "ивано-франковск", "ivano-frankivsk", "ivano-frankovsk",
            "івано-франківська", "ивано-франковская", "ivano-frankivska", "прикарпаття",
        ],
    },
    RegionDef {
        key: "kherson",
        display_name: "Херсонська область",
        aliases: &["херсон", "kherson", "херсонська", "херсонская", "khersonska"],
    },
    RegionDef {
        key: "mykolaiv",
        display_name: "Миколаївська область",
        aliases: &["миколаїв", "николаев", "mykolaiv", "nikolaev", "миколаївська", "николаевская", "mykolaivska"],
    },
    RegionDef {
        key: "chernivtsi",
        display_name: "Чернівецька область",
        aliases: &["чернівці", "черновцы", "chernivtsi", "chernovtsy", "чернівецька", "черновицкая", "chernivetska"],
    },
    RegionDef {
        key: "zakarpattia",
        display_name: "Закарпатська область",
        aliases: &[
            "закарпаття", "закарпатье", "zakarpattia", "transcarpathia", "ужгород", "uzhhorod",
            "закарпатська", "закарпатская", "zakarpatska",
        ],
    },
    RegionDef {
        key: "volyn",
        display_name: "Волинська область",
        aliases: &["волинь", "волынь", "volyn", "луцьк", "луцк", "lutsk", "волинська", "волынская", "volynska"],
    },
    RegionDef {
        key: "luhansk",
        display_name: "Луганська область",
        aliases: &["луганськ", "луганск", "luhansk", "lugansk", "луганська", "луганская", "luhanska"],
    },
    RegionDef {
        key: "kirovohrad",
        display_name: "Кіровоградська область",
        aliases: &[
            "кропивницький", "кропивницкий", "kropyvnytskyi", "кіровоградська", "кировоградская",
            "kirovohradska", "kirovohrad",
        ],
    },
];

/// Trailing qualifiers stripped before a second lookup attempt
const REGION_SUFFIXES: &[&str] = &[
    " область",
    " обл.",
    " обл",
    " oblast",
    " region",
    " регіон",
    " регион",
];

static ALIAS_INDEX: Lazy<HashMap<String, &'static RegionDef>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for def in REGIONS {
        index.insert(def.key.to_string(), def);
        index.insert(fold(def.display_name), def);
        for alias in def.aliases {
            index.insert(fold(alias), def);
        }
    }
    index
});

/// Case-fold and tidy a region name for lookup: trims, lowercases, collapses
/// whitespace and unifies apostrophe variants.
pub fn fold(name: &str) -> String {
    let lowered = name.trim().to_lowercase().replace(['’', 'ʼ', '`', '‘'], "'");
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn lookup(name: &str) -> Option<&'static RegionDef> {
    let folded = fold(name);
    if let Some(def) = ALIAS_INDEX.get(&folded) {
        return Some(def);
    }
    REGION_SUFFIXES
        .iter()
        .filter_map(|suffix| folded.strip_suffix(suffix))
        .find_map(|stem| ALIAS_INDEX.get(stem.trim_end()).copied())
}

/// Deterministic key for names missing from the alias table
pub fn slug(name: &str) -> String {
    let folded = fold(name);
    if folded.is_empty() {
        return "unknown".to_string();
    }
    folded.replace(' ', "_")
}

pub fn normalize_region_name(name: &str) -> RegionKey {
    match lookup(name) {
        Some(def) => RegionKey::new(def.key),
        None => RegionKey::new(slug(name)),
    }
}

/// Canonical display name for a region, or the trimmed source spelling
pub fn display_name(name: &str) -> String {
    match lookup(name) {
        Some(def) => def.display_name.to_string(),
        None => name.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_alias_maps_to_its_region() {
        for def in REGIONS {
            assert_eq!(normalize_region_name(def.key).as_str(), def.key);
            assert_eq!(normalize_region_name(def.display_name).as_str(), def.key);
            for alias in def.aliases {
                assert_eq!(normalize_region_name(alias).as_str(), def.key, "alias {alias}");
                assert_eq!(
                    normalize_region_name(&alias.to_uppercase()).as_str(),
                    def.key,
                    "uppercase alias {alias}"
                );
            }
        }
    }

    #[test]
    fn test_kyiv_spellings_agree() {
        let expected = RegionKey::new("kyiv");
        for name in ["Kyiv", "Київ", "КИЇВ", "  Киев ", "Kiev", "Київська область", "Kyiv Oblast"] {
            assert_eq!(normalize_region_name(name), expected, "{name}");
        }
    }

    #[test]
    fn test_suffixes_are_stripped() {
        assert_eq!(normalize_region_name("Львовская область").as_str(), "lviv");
        assert_eq!(normalize_region_name("Харківська обл.").as_str(), "kharkiv");
        assert_eq!(normalize_region_name("Odesa region").as_str(), "odesa");
    }

    #[test]
    fn test_unmapped_names_fall_back_to_slug() {
        assert_eq!(normalize_region_name("Автономна Республіка  Крим").as_str(), "автономна_республіка_крим");
        assert_eq!(normalize_region_name("Some Place").as_str(), "some_place");
        assert_eq!(display_name("  Some Place "), "Some Place");
    }

    #[test]
    fn test_display_name_is_canonical() {
        assert_eq!(display_name("lviv"), "Львівська область");
        assert_eq!(display_name("Киев"), "Київ та область");
    }

    #[test]
    fn test_apostrophes_are_unified() {
        assert_eq!(fold("Кам’янське"), fold("Кам'янське"));
    }
}
