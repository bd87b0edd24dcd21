use std::borrow::Cow;

/// Raw backend status fragments (lowercase) and the sentence shown instead.
/// Scanned in order; the first fragment contained in the message wins.
pub const BUSINESS_MESSAGES: &[(&str, &str)] = &[
    ("iniciando", "Arrancando el proceso de depuración y control de datos."),
    ("cargando cotizaciones", "Tomando la referencia del dólar para convertir precios."),
    ("eliminando columnas", "Depurando campos innecesarios de la base."),
    ("intercambiando latitud", "Reordenando ubicaciones geográficas."),
    ("renombrando columnas", "Normalizando nombres para análisis."),
    ("filtrando monedas", "Quitando publicaciones en moneda no soportada."),
    ("convirtiendo precios", "Unificando precios en dólares."),
    ("eliminando filas con datos faltantes", "Conservando solo avisos con datos completos."),
    ("filtrando outliers", "Descartando valores fuera de mercado."),
    ("guardando", "Guardando el archivo final para el panel."),
    ("pipeline finalizado", "Pipeline listo. Datos actualizados."),
    ("etapa clean finalizada", "Limpieza lista. Datos depurados."),
    ("etapa convert finalizada", "Conversión lista. Precios unificados."),
    ("error", "Se detectó un problema. Revisar los datos de origen."),
];

/// Rewrite a raw pipeline status line into business language.
/// Unknown messages come back unchanged.
pub fn business_message(raw: &str) -> Cow<'_, str> {
    let lower = raw.to_lowercase();
    BUSINESS_MESSAGES
        .iter()
        .find(|(pattern, _)| lower.contains(pattern))
        .map_or(Cow::Borrowed(raw), |(_, text)| Cow::Borrowed(*text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_fragment_is_translated() {
        assert_eq!(
            business_message("Cargando cotizaciones del dólar..."),
            "Tomando la referencia del dólar para convertir precios."
        );
    }

    #[test]
    fn test_match_is_case_insensitive() {
        assert_eq!(
            business_message("FILTRANDO OUTLIERS por precio/m2"),
            "Descartando valores fuera de mercado."
        );
    }

    #[test]
    fn test_unknown_message_passes_through() {
        assert_eq!(business_message("Conectado al servidor."), "Conectado al servidor.");
        assert!(matches!(business_message("otra cosa"), Cow::Borrowed("otra cosa")));
    }

    #[test]
    fn test_first_match_wins() {
        // Contains both "iniciando" and "error"; the earlier entry wins.
        assert_eq!(
            business_message("Iniciando etapa: error handling"),
            "Arrancando el proceso de depuración y control de datos."
        );
        assert_eq!(
            business_message("Etapa clean finalizada con éxito."),
            "Limpieza lista. Datos depurados."
        );
    }

    #[test]
    fn test_error_fallback_entry() {
        assert_eq!(
            business_message("Error en la etapa convert. Código de salida: 1"),
            "Se detectó un problema. Revisar los datos de origen."
        );
    }

    #[test]
    fn test_every_pattern_maps_to_its_sentence() {
        for (pattern, text) in BUSINESS_MESSAGES {
            let raw = format!(">> {} <<", pattern.to_uppercase());
            // Earlier patterns never occur inside later ones, so each maps to itself.
            assert_eq!(business_message(&raw), *text, "pattern {:?}", pattern);
        }
    }
}
