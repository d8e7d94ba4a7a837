//! Asignación de empresa a partir del nombre de fichero (`<prefijo>-...`).

use anyhow::{anyhow, Result};

/// Tabla prefijo → nombre de empresa. Conserva el orden de declaración, que
/// es también el orden en el que se consulta a cada empresa.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompanyMap {
    entries: Vec<(String, String)>,
}

impl Default for CompanyMap {
    fn default() -> Self {
        Self::new([
            ("pypl", "PayPal"),
            ("sq", "Square"),
            ("tost", "Toast"),
            ("fi", "Fiserv"),
        ])
    }
}

impl CompanyMap {
    pub fn new<I, P, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, N)>,
        P: Into<String>,
        N: Into<String>,
    {
        let mut map = Self { entries: Vec::new() };
        for (prefix, name) in entries {
            map.insert(prefix.into(), name.into());
        }
        map
    }

    /// Interpreta `"pypl=PayPal,sq=Square"`.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut map = Self { entries: Vec::new() };
        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (prefix, name) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("Entrada de COMPANY_MAP sin '=': '{pair}'"))?;
            let (prefix, name) = (prefix.trim(), name.trim());
            if prefix.is_empty() || name.is_empty() {
                return Err(anyhow!("Entrada de COMPANY_MAP incompleta: '{pair}'"));
            }
            map.insert(prefix.to_string(), name.to_string());
        }
        if map.entries.is_empty() {
            return Err(anyhow!("COMPANY_MAP no contiene ninguna empresa"));
        }
        Ok(map)
    }

    fn insert(&mut self, prefix: String, name: String) {
        let prefix = prefix.to_lowercase();
        match self.entries.iter_mut().find(|(p, _)| *p == prefix) {
            Some(entry) => entry.1 = name,
            None => self.entries.push((prefix, name)),
        }
    }

    /// Empresa de un fichero. Nunca falla: un prefijo desconocido se
    /// devuelve tal cual, en minúsculas.
    pub fn company_for(&self, filename: &str) -> String {
        let prefix = filename
            .split_once('-')
            .map_or(filename, |(head, _)| head)
            .to_lowercase();

        self.entries
            .iter()
            .find(|(p, _)| *p == prefix)
            .map(|(_, name)| name.clone())
            .unwrap_or(prefix)
    }

    /// Empresas conocidas, en orden de declaración y sin duplicados.
    pub fn companies(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.entries.len());
        for (_, name) in &self.entries {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
}
