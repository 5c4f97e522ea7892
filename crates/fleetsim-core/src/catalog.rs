//! Fixed, ordered domain lists and the resolvers that index into them.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::seed::{offset, Seed};
use crate::SynthError;

const ADDRESS_SHARE: f64 = 0.25;
const MAX_STREET_NUMBER: u32 = 3_999;

/// A non-empty ordered list. Emptiness is rejected on construction, so a
/// pick can never index out of bounds.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(try_from = "Vec<T>", into = "Vec<T>")]
pub struct Catalog<T: Clone> {
    items: Vec<T>,
}

impl<T: Clone> Catalog<T> {
    /// # Errors
    /// Returns [`SynthError::Validation`] when `items` is empty.
    pub fn new(items: Vec<T>) -> Result<Self, SynthError> {
        if items.is_empty() {
            return Err(SynthError::Validation("catalog MUST contain at least one entry".to_string()));
        }
        Ok(Self { items })
    }

    /// `items[floor(scalar(seed, offset) * len)]`.
    #[must_use]
    pub fn pick(&self, seed: Seed, offset: u64) -> &T {
        &self.items[seed.index(offset, self.items.len())]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: Clone> TryFrom<Vec<T>> for Catalog<T> {
    type Error = SynthError;

    fn try_from(items: Vec<T>) -> Result<Self, Self::Error> {
        Self::new(items)
    }
}

impl<T: Clone> From<Catalog<T>> for Vec<T> {
    fn from(catalog: Catalog<T>) -> Self {
        catalog.items
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct EventTemplate {
    pub name: String,
    pub instructions: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Geofence,
    Address,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Location {
    pub kind: LocationKind,
    pub name: String,
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Every list the generators read. Injected into [`crate::FleetSynth`] so
/// tests and deployments can substitute their own fixtures.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Catalogs {
    pub templates: Catalog<EventTemplate>,
    pub tags: Catalog<String>,
    pub assignees: Catalog<String>,
    pub streets: Catalog<String>,
    pub neighborhoods: Catalog<String>,
    pub geofences: Catalog<String>,
}

impl Catalogs {
    /// Named geofence (75%) or synthesized street address (25%). The end of a
    /// lifecycle passes its own base offset so both names stay independent.
    #[must_use]
    pub fn resolve_location(&self, seed: Seed, base: u64) -> Location {
        if seed.draw(base + offset::LOCATION_KIND) < ADDRESS_SHARE {
            let street = self.streets.pick(seed, base + offset::LOCATION_ENTRY);
            let number = seed.range(base + offset::LOCATION_NUMBER, 1, MAX_STREET_NUMBER);
            let neighborhood = self.neighborhoods.pick(seed, base + offset::LOCATION_NEIGHBORHOOD);
            return Location {
                kind: LocationKind::Address,
                name: format!("{street} {number}, Col. {neighborhood}"),
            };
        }

        Location {
            kind: LocationKind::Geofence,
            name: self.geofences.pick(seed, base + offset::LOCATION_ENTRY).clone(),
        }
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

fn builtin<T: Clone>(items: Vec<T>) -> Catalog<T> {
    // Built-in lists below are non-empty literals.
    Catalog { items }
}

impl Default for Catalogs {
    fn default() -> Self {
        let templates = [
            ("Exceso de velocidad", "Contactar al operador y confirmar la velocidad actual de la unidad."),
            ("Frenado brusco", "Revisar la telemetría del tramo y registrar la causa con el operador."),
            ("Aceleración brusca", "Recordar al operador la política de manejo eficiente."),
            ("Salida de geocerca", "Verificar si la salida estaba programada en la ruta asignada."),
            ("Entrada a geocerca", "Confirmar la llegada con el responsable del sitio."),
            ("Botón de pánico", "Llamar de inmediato al operador y escalar a seguridad si no responde."),
            ("Desconexión de batería", "Solicitar revisión del equipo GPS en el próximo punto de servicio."),
            ("Parada no autorizada", "Contactar al operador para conocer el motivo de la detención."),
            ("Ralentí prolongado", "Pedir al operador apagar el motor si la espera se extiende."),
            ("Pérdida de señal GPS", "Monitorear la reconexión y notificar a soporte si persiste."),
            ("Apertura de puerta", "Validar que la apertura ocurra en un punto de entrega autorizado."),
            ("Temperatura fuera de rango", "Revisar la caja refrigerada y ajustar el termostato."),
        ]
        .into_iter()
        .map(|(name, instructions)| EventTemplate {
            name: name.to_string(),
            instructions: instructions.to_string(),
        })
        .collect();

        Self {
            templates: builtin(templates),
            tags: builtin(owned(&[
                "Operaciones",
                "Seguridad",
                "Mantenimiento",
                "Logística",
                "Cliente",
                "Combustible",
                "Urgente",
            ])),
            assignees: builtin(owned(&[
                "ana.martinez@flota.mx",
                "carlos.ramirez@flota.mx",
                "lucia.hernandez@flota.mx",
                "jorge.lopez@flota.mx",
                "sofia.garcia@flota.mx",
                "miguel.torres@flota.mx",
            ])),
            streets: builtin(owned(&[
                "Av. Insurgentes Sur",
                "Av. Reforma",
                "Calz. de Tlalpan",
                "Av. Universidad",
                "Eje Central Lázaro Cárdenas",
                "Av. Revolución",
                "Av. Chapultepec",
                "Calle Durango",
                "Calle Madero",
                "Av. Río Churubusco",
            ])),
            neighborhoods: builtin(owned(&[
                "Roma Norte",
                "Condesa",
                "Del Valle",
                "Narvarte",
                "Centro",
                "Juárez",
                "Coyoacán",
                "Polanco",
                "Escandón",
                "San Rafael",
            ])),
            geofences: builtin(owned(&[
                "Centro de Distribución Norte",
                "Almacén Vallejo",
                "Patio de Maniobras Iztapalapa",
                "Base Operativa Tlalnepantla",
                "Cliente Walmart Azcapotzalco",
                "Terminal de Carga AICM",
                "Taller Central",
                "Zona de Descarga Central de Abasto",
            ])),
        }
    }
}
