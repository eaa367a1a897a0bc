//! Language management: locale resolution, translations and localized links.
//!
//! Pages live under a locale directory (`/pt/`, `/en/`, `/es/`), so the URL
//! path is the source of truth for the current language. The chosen language
//! is remembered in `localStorage` and consulted only when the path carries
//! no locale segment.
//!
//! Page filenames are localized too (`sobre-mim.html`, `about-me.html`,
//! `sobre-mi.html`); [`PAGE_MAP`] ties them together so the language switcher
//! can link each locale's version of the current page.
//!
//! Lookup falls back from the current locale to the configured fallback
//! locale and finally to the key itself, so a missing translation shows up
//! as a readable key instead of an empty string.

use crate::config::I18nConfig;
use crate::storage::KeyValueStore;
use crate::types::Locale;
use std::collections::HashMap;

type Table = &'static [(&'static str, &'static str)];

const PT: Table = &[
    ("portuguese", "Português"),
    ("english", "Inglês"),
    ("spanish", "Espanhol"),
    ("home", "Início"),
    ("presentations", "Apresentações"),
    ("designs", "Designs"),
    ("photos", "Fotografias"),
    ("videos", "Vídeos"),
    ("about_me", "Sobre Mim"),
    ("contact", "Contactos"),
    ("horizontal", "Horizontais"),
    ("vertical", "Verticais"),
    ("close", "Fechar"),
    ("next", "Seguinte"),
    ("previous", "Anterior"),
    ("loading_content", "A carregar conteúdo..."),
    ("no_content_found", "Nenhum conteúdo para '{type}' encontrado."),
    ("error_loading_content", "Erro ao carregar {type}. Por favor, tente novamente mais tarde."),
    ("loading_presentations", "A carregar apresentações..."),
    ("no_presentations_found", "Não foram encontradas apresentações."),
    ("consent_title", "Utilizamos Cookies"),
    (
        "consent_message",
        "Este site utiliza cookies para melhorar a sua experiência de navegação, analisar o tráfego e personalizar conteúdo. Pode escolher quais cookies aceitar.",
    ),
    ("consent_accept_all", "Aceitar Todos"),
    ("consent_accept_necessary", "Apenas Necessários"),
    ("consent_settings", "Configurações"),
    ("consent_save", "Guardar Preferências"),
    ("consent_necessary", "Cookies Necessários"),
    ("consent_analytics", "Cookies de Análise"),
    ("consent_marketing", "Cookies de Marketing"),
    ("consent_necessary_desc", "Estes cookies são essenciais para o funcionamento básico do site."),
    ("consent_analytics_desc", "Ajudam-nos a entender como os visitantes interagem com o site."),
    ("consent_marketing_desc", "Utilizados para mostrar anúncios relevantes aos utilizadores."),
    ("privacy_policy", "Política de Privacidade"),
];

const EN: Table = &[
    ("portuguese", "Portuguese"),
    ("english", "English"),
    ("spanish", "Spanish"),
    ("home", "Home"),
    ("presentations", "Presentations"),
    ("designs", "Designs"),
    ("photos", "Photos"),
    ("videos", "Videos"),
    ("about_me", "About Me"),
    ("contact", "Contact"),
    ("horizontal", "Horizontal"),
    ("vertical", "Vertical"),
    ("close", "Close"),
    ("next", "Next"),
    ("previous", "Previous"),
    ("loading_content", "Loading content..."),
    ("no_content_found", "No content for '{type}' found."),
    ("error_loading_content", "Error loading {type}. Please try again later."),
    ("loading_presentations", "Loading presentations..."),
    ("no_presentations_found", "No presentations found."),
    ("consent_title", "We Use Cookies"),
    (
        "consent_message",
        "This website uses cookies to improve your browsing experience, analyze traffic and personalize content. You can choose which cookies to accept.",
    ),
    ("consent_accept_all", "Accept All"),
    ("consent_accept_necessary", "Necessary Only"),
    ("consent_settings", "Settings"),
    ("consent_save", "Save Preferences"),
    ("consent_necessary", "Necessary Cookies"),
    ("consent_analytics", "Analytics Cookies"),
    ("consent_marketing", "Marketing Cookies"),
    ("consent_necessary_desc", "These cookies are essential for the basic functioning of the website."),
    ("consent_analytics_desc", "Help us understand how visitors interact with the website."),
    ("consent_marketing_desc", "Used to show relevant advertisements to users."),
    ("privacy_policy", "Privacy Policy"),
];

const ES: Table = &[
    ("portuguese", "Portugués"),
    ("english", "Inglés"),
    ("spanish", "Español"),
    ("home", "Inicio"),
    ("presentations", "Presentaciones"),
    ("designs", "Diseños"),
    ("photos", "Fotografías"),
    ("videos", "Vídeos"),
    ("about_me", "Sobre Mí"),
    ("contact", "Contacto"),
    ("horizontal", "Horizontales"),
    ("vertical", "Verticales"),
    ("close", "Cerrar"),
    ("next", "Siguiente"),
    ("previous", "Anterior"),
    ("loading_content", "Cargando contenido..."),
    ("no_content_found", "No se encontró contenido para '{type}'."),
    ("error_loading_content", "Error al cargar {type}. Por favor, inténtelo de nuevo más tarde."),
    ("loading_presentations", "Cargando presentaciones..."),
    ("no_presentations_found", "No se encontraron presentaciones."),
    ("consent_title", "Utilizamos Cookies"),
    (
        "consent_message",
        "Este sitio web utiliza cookies para mejorar su experiencia de navegación, analizar el tráfico y personalizar el contenido. Puede elegir qué cookies aceptar.",
    ),
    ("consent_accept_all", "Aceptar Todas"),
    ("consent_accept_necessary", "Solo Necesarias"),
    ("consent_settings", "Configuraciones"),
    ("consent_save", "Guardar Preferencias"),
    ("consent_necessary", "Cookies Necesarias"),
    ("consent_analytics", "Cookies de Análisis"),
    ("consent_marketing", "Cookies de Marketing"),
    ("consent_necessary_desc", "Estas cookies son esenciales para el funcionamiento básico del sitio web."),
    ("consent_analytics_desc", "Nos ayudan a entender cómo los visitantes interactúan con el sitio web."),
    ("consent_marketing_desc", "Utilizadas para mostrar anuncios relevantes a los usuarios."),
    ("privacy_policy", "Política de Privacidad"),
];

/// Localized page filenames: `(pt, en, es)`. The Portuguese name is the page key.
pub const PAGE_MAP: &[(&str, &str, &str)] = &[
    ("index.html", "index.html", "index.html"),
    ("apresentacoes.html", "presentations.html", "presentaciones.html"),
    ("contactos.html", "contacts.html", "contactos.html"),
    ("designs.html", "designs.html", "disenos.html"),
    ("fotos-horizontais.html", "photos-horizontal.html", "fotos-horizontales.html"),
    ("fotos-verticais.html", "photos-vertical.html", "fotos-verticales.html"),
    ("sobre-mim.html", "about-me.html", "sobre-mi.html"),
    ("videos-horizontais.html", "videos-horizontal.html", "videos-horizontales.html"),
    ("videos-verticais.html", "videos-vertical.html", "videos-verticales.html"),
];

/// Translation dictionary for every supported locale.
#[derive(Debug, Clone)]
pub struct Translations {
    tables: HashMap<Locale, HashMap<&'static str, String>>,
}

impl Translations {
    /// The dictionary shipped with the site.
    pub fn builtin() -> Self {
        let mut tables = HashMap::new();
        for (locale, table) in [(Locale::Pt, PT), (Locale::En, EN), (Locale::Es, ES)] {
            tables.insert(
                locale,
                table.iter().map(|(k, v)| (*k, (*v).to_string())).collect(),
            );
        }
        Self { tables }
    }

    /// Override or add one entry.
    pub fn insert(&mut self, locale: Locale, key: &'static str, value: impl Into<String>) {
        self.tables.entry(locale).or_default().insert(key, value.into());
    }

    pub fn get(&self, locale: Locale, key: &str) -> Option<&str> {
        self.tables.get(&locale)?.get(key).map(String::as_str)
    }
}

/// The language a page is rendered in, passed explicitly to every controller.
#[derive(Debug, Clone)]
pub struct LanguageContext {
    current: Locale,
    fallback: Locale,
    storage_key: String,
    translations: Translations,
}

impl LanguageContext {
    pub fn new(current: Locale, config: &I18nConfig) -> Self {
        Self {
            current,
            fallback: config.fallback_locale,
            storage_key: config.storage_key.clone(),
            translations: Translations::builtin(),
        }
    }

    /// Resolve the page language: URL path segment, then stored preference,
    /// then the configured default. A locale found in the path is stored.
    pub fn resolve(path: &str, config: &I18nConfig, store: &mut dyn KeyValueStore) -> Self {
        let current = match locale_from_path(path) {
            Some(locale) => {
                store.set(&config.storage_key, locale.code());
                locale
            }
            None => store
                .get(&config.storage_key)
                .and_then(|code| Locale::from_code(&code))
                .unwrap_or(config.default_locale),
        };
        log::debug!("page language resolved to {current} from '{path}'");
        Self::new(current, config)
    }

    pub fn current(&self) -> Locale {
        self.current
    }

    pub fn fallback(&self) -> Locale {
        self.fallback
    }

    pub fn translations_mut(&mut self) -> &mut Translations {
        &mut self.translations
    }

    /// Switch language by code and remember the choice.
    ///
    /// Unsupported codes leave the language unchanged and return `false`.
    pub fn set_language(&mut self, code: &str, store: &mut dyn KeyValueStore) -> bool {
        match Locale::from_code(code) {
            Some(locale) => {
                self.current = locale;
                store.set(&self.storage_key, locale.code());
                true
            }
            None => {
                log::warn!("language '{code}' not supported");
                false
            }
        }
    }

    /// Translate `key`: current locale, then fallback locale, then the key.
    pub fn translate(&self, key: &str) -> String {
        self.translations
            .get(self.current, key)
            .or_else(|| self.translations.get(self.fallback, key))
            .unwrap_or(key)
            .to_string()
    }

    /// Translate `key` and substitute `{name}` placeholders.
    pub fn translate_with(&self, key: &str, replacements: &[(&str, &str)]) -> String {
        replacements
            .iter()
            .fold(self.translate(key), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }
}

/// Locale named by the first locale-code segment of a URL path.
///
/// `/pt/designs.html` → `pt`; `/Bia/en/index.html` → `en`; `/index.html` → none.
pub fn locale_from_path(path: &str) -> Option<Locale> {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    // The last segment is the page file, never a locale directory
    if segments.last().is_some_and(|s| s.contains('.')) {
        segments.pop();
    }
    segments.into_iter().find_map(|s| {
        Locale::ALL
            .into_iter()
            .find(|l| l.code() == s)
    })
}

/// Filename of `page_key` (a Portuguese page filename) in `locale`.
///
/// Unknown keys map to themselves.
pub fn localized_page(page_key: &str, locale: Locale) -> &str {
    PAGE_MAP
        .iter()
        .find(|(pt, _, _)| *pt == page_key)
        .map(|(pt, en, es)| match locale {
            Locale::Pt => *pt,
            Locale::En => *en,
            Locale::Es => *es,
        })
        .unwrap_or(page_key)
}

/// Page key (Portuguese filename) of the page at `path`.
///
/// Paths that match no known page resolve to `index.html`.
pub fn page_key(path: &str) -> &'static str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let file = path.rsplit('/').next().unwrap_or_default();
    let locale = locale_from_path(path);
    PAGE_MAP
        .iter()
        .find(|(pt, en, es)| match locale {
            Some(Locale::Pt) => *pt == file,
            Some(Locale::En) => *en == file,
            Some(Locale::Es) => *es == file,
            None => *pt == file || *en == file || *es == file,
        })
        .map(|(pt, _, _)| *pt)
        .unwrap_or("index.html")
}

/// Relative nav link to `page_key` in `locale`: `../en/about-me.html`.
pub fn nav_href(page_key: &str, locale: Locale) -> String {
    format!("../{}/{}", locale.code(), localized_page(page_key, locale))
}

/// One entry of the language switcher.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitcherLink {
    pub locale: Locale,
    pub href: String,
    pub label: &'static str,
    pub flag: &'static str,
    pub active: bool,
}

/// Links to the current page in every locale.
pub fn switcher_links(path: &str, current: Locale) -> Vec<SwitcherLink> {
    let key = page_key(path);
    Locale::ALL
        .into_iter()
        .map(|locale| SwitcherLink {
            locale,
            href: nav_href(key, locale),
            label: match locale {
                Locale::Pt => "PT",
                Locale::En => "EN",
                Locale::Es => "ES",
            },
            flag: locale.flag(),
            active: locale == current,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn config() -> I18nConfig {
        I18nConfig::default()
    }

    #[test]
    fn every_locale_has_every_key() {
        let pt: Vec<_> = PT.iter().map(|(k, _)| *k).collect();
        for table in [EN, ES] {
            let keys: Vec<_> = table.iter().map(|(k, _)| *k).collect();
            assert_eq!(keys, pt);
        }
    }

    #[test]
    fn locale_from_path_variants() {
        assert_eq!(locale_from_path("/pt/designs.html"), Some(Locale::Pt));
        assert_eq!(locale_from_path("/Bia/en/index.html"), Some(Locale::En));
        assert_eq!(locale_from_path("/es/"), Some(Locale::Es));
        assert_eq!(locale_from_path("/index.html"), None);
        assert_eq!(locale_from_path("/fr/index.html"), None);
        assert_eq!(locale_from_path("/pt.html"), None);
    }

    #[test]
    fn resolve_prefers_path_and_stores_it() {
        let mut store = MemoryStore::new();
        let ctx = LanguageContext::resolve("/en/about-me.html", &config(), &mut store);
        assert_eq!(ctx.current(), Locale::En);
        assert_eq!(store.get("preferredLanguage").as_deref(), Some("en"));
    }

    #[test]
    fn resolve_uses_stored_preference_without_path_locale() {
        let mut store = MemoryStore::new();
        store.set("preferredLanguage", "es");
        let ctx = LanguageContext::resolve("/index.html", &config(), &mut store);
        assert_eq!(ctx.current(), Locale::Es);
    }

    #[test]
    fn resolve_defaults_to_configured_locale() {
        let mut store = MemoryStore::new();
        store.set("preferredLanguage", "klingon");
        let ctx = LanguageContext::resolve("/", &config(), &mut store);
        assert_eq!(ctx.current(), Locale::Pt);
    }

    #[test]
    fn set_language_rejects_unsupported() {
        let mut store = MemoryStore::new();
        let mut ctx = LanguageContext::new(Locale::Pt, &config());
        assert!(!ctx.set_language("de", &mut store));
        assert_eq!(ctx.current(), Locale::Pt);
        assert_eq!(store.get("preferredLanguage"), None);

        assert!(ctx.set_language("es", &mut store));
        assert_eq!(ctx.current(), Locale::Es);
        assert_eq!(store.get("preferredLanguage").as_deref(), Some("es"));
    }

    #[test]
    fn translate_falls_back_to_fallback_then_key() {
        let mut ctx = LanguageContext::new(Locale::En, &config());
        ctx.translations_mut().insert(Locale::Pt, "only_pt", "Só PT");
        assert_eq!(ctx.translate("close"), "Close");
        assert_eq!(ctx.translate("only_pt"), "Só PT");
        assert_eq!(ctx.translate("no_such_key"), "no_such_key");
    }

    #[test]
    fn translate_with_replaces_placeholders() {
        let ctx = LanguageContext::new(Locale::En, &config());
        assert_eq!(
            ctx.translate_with("error_loading_content", &[("type", "Photos")]),
            "Error loading Photos. Please try again later."
        );
    }

    #[test]
    fn page_map_lookups() {
        assert_eq!(localized_page("sobre-mim.html", Locale::En), "about-me.html");
        assert_eq!(localized_page("sobre-mim.html", Locale::Es), "sobre-mi.html");
        assert_eq!(localized_page("unknown.html", Locale::En), "unknown.html");
        assert_eq!(page_key("/en/about-me.html"), "sobre-mim.html");
        assert_eq!(page_key("/es/disenos.html"), "designs.html");
        assert_eq!(page_key("/pt/nada.html"), "index.html");
    }

    #[test]
    fn page_key_uses_path_locale_for_shared_names() {
        // contactos.html is the Portuguese and the Spanish filename
        assert_eq!(page_key("/es/contactos.html"), "contactos.html");
        assert_eq!(page_key("/en/contacts.html"), "contactos.html");
    }

    #[test]
    fn switcher_links_point_to_same_page() {
        let links = switcher_links("/en/photos-vertical.html", Locale::En);
        let hrefs: Vec<_> = links.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(
            hrefs,
            vec![
                "../pt/fotos-verticais.html",
                "../en/photos-vertical.html",
                "../es/fotos-verticales.html"
            ]
        );
        assert!(links[1].active);
        assert!(!links[0].active);
        assert_eq!(links[1].flag, "gb");
    }
}
