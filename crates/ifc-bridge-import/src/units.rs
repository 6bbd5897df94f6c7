// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unit normalization
//!
//! Every unit of a file is resolved once into a [`Unit`] that converts file
//! values into host values. Host values are SI values except for lengths,
//! which are expressed in the host's internal length unit, so any quantity
//! with a length dimension carries the matching power of
//! `internal_units_per_metre`.

use crate::error::{ImportError, Result};
use crate::session::ImportSession;
use ifc_bridge_model::{DecodedEntity, EntityId, IfcType};
use log::debug;
use rustc_hash::FxHashMap;

/// Quantity measured by a unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitType {
    Length,
    Area,
    Volume,
    Mass,
    Time,
    PlaneAngle,
    SolidAngle,
    ThermodynamicTemperature,
    ElectricCurrent,
    LuminousIntensity,
    AmountOfSubstance,
    Force,
    Pressure,
    Power,
    Energy,
    Illuminance,
    LuminousFlux,
    Frequency,
    ElectricVoltage,
    // Derived quantities
    LinearVelocity,
    MassDensity,
    MassFlowRate,
    VolumetricFlowRate,
    ThermalTransmittance,
    ThermalConductance,
    HeatFluxDensity,
    LinearForce,
    PlanarForce,
    LinearMoment,
    Monetary,
    Custom(String),
}

impl UnitType {
    /// From an `IfcUnitEnum` or `IfcDerivedUnitEnum` value
    pub fn parse(value: &str) -> Self {
        let upper = value.to_ascii_uppercase();
        let name = upper.strip_suffix("UNIT").unwrap_or(&upper);
        match name {
            "LENGTH" => UnitType::Length,
            "AREA" => UnitType::Area,
            "VOLUME" => UnitType::Volume,
            "MASS" => UnitType::Mass,
            "TIME" => UnitType::Time,
            "PLANEANGLE" => UnitType::PlaneAngle,
            "SOLIDANGLE" => UnitType::SolidAngle,
            "THERMODYNAMICTEMPERATURE" => UnitType::ThermodynamicTemperature,
            "ELECTRICCURRENT" => UnitType::ElectricCurrent,
            "LUMINOUSINTENSITY" => UnitType::LuminousIntensity,
            "AMOUNTOFSUBSTANCE" => UnitType::AmountOfSubstance,
            "FORCE" => UnitType::Force,
            "PRESSURE" => UnitType::Pressure,
            "POWER" => UnitType::Power,
            "ENERGY" => UnitType::Energy,
            "ILLUMINANCE" => UnitType::Illuminance,
            "LUMINOUSFLUX" => UnitType::LuminousFlux,
            "FREQUENCY" => UnitType::Frequency,
            "ELECTRICVOLTAGE" => UnitType::ElectricVoltage,
            "LINEARVELOCITY" => UnitType::LinearVelocity,
            "MASSDENSITY" => UnitType::MassDensity,
            "MASSFLOWRATE" => UnitType::MassFlowRate,
            "VOLUMETRICFLOWRATE" => UnitType::VolumetricFlowRate,
            "THERMALTRANSMITTANCE" => UnitType::ThermalTransmittance,
            "THERMALCONDUCTANCE" => UnitType::ThermalConductance,
            "HEATFLUXDENSITY" => UnitType::HeatFluxDensity,
            "LINEARFORCE" => UnitType::LinearForce,
            "PLANARFORCE" => UnitType::PlanarForce,
            "LINEARMOMENT" => UnitType::LinearMoment,
            _ => UnitType::Custom(upper),
        }
    }

    /// Power of the host length unit in this quantity
    pub fn length_exponent(&self) -> i32 {
        match self {
            UnitType::Length | UnitType::Force => 1,
            UnitType::Area | UnitType::Power | UnitType::Energy => 2,
            UnitType::Volume => 3,
            UnitType::Pressure => -1,
            UnitType::Illuminance => -2,
            _ => 0,
        }
    }

    /// Power an SI prefix is raised to (square and cubic metres)
    fn prefix_power(&self) -> i32 {
        match self {
            UnitType::Area => 2,
            UnitType::Volume => 3,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSystem {
    Metric,
    Imperial,
}

/// Resolved unit; immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub unit_type: UnitType,
    pub scale_factor: f64,
    pub offset_factor: f64,
    pub system: UnitSystem,
    pub symbol: String,
}

impl Unit {
    /// File value to host value
    #[inline]
    pub fn convert(&self, value: f64) -> f64 {
        value * self.scale_factor - self.offset_factor
    }

    /// Host value to file value
    #[inline]
    pub fn inverse_convert(&self, value: f64) -> f64 {
        (value + self.offset_factor) / self.scale_factor
    }

    /// Unprefixed SI unit of `unit_type` in host terms
    pub fn si_default(unit_type: UnitType, internal_units_per_metre: f64) -> Self {
        let symbol = default_symbol(&unit_type).to_string();
        Self {
            scale_factor: si_scale(None, &unit_type, internal_units_per_metre),
            unit_type,
            offset_factor: 0.0,
            system: UnitSystem::Metric,
            symbol,
        }
    }
}

fn default_symbol(unit_type: &UnitType) -> &'static str {
    match unit_type {
        UnitType::Length => "m",
        UnitType::Area => "m²",
        UnitType::Volume => "m³",
        UnitType::Mass => "kg",
        UnitType::Time => "s",
        UnitType::PlaneAngle => "rad",
        UnitType::SolidAngle => "sr",
        UnitType::ThermodynamicTemperature => "K",
        UnitType::ElectricCurrent => "A",
        UnitType::LuminousIntensity => "cd",
        UnitType::AmountOfSubstance => "mol",
        UnitType::Force => "N",
        UnitType::Pressure => "Pa",
        UnitType::Power => "W",
        UnitType::Energy => "J",
        UnitType::Illuminance => "lx",
        UnitType::LuminousFlux => "lm",
        UnitType::Frequency => "Hz",
        UnitType::ElectricVoltage => "V",
        _ => "",
    }
}

/// SI prefixes as (name, decimal exponent, symbol)
const SI_PREFIXES: &[(&str, i32, &str)] = &[
    ("EXA", 18, "E"),
    ("PETA", 15, "P"),
    ("TERA", 12, "T"),
    ("GIGA", 9, "G"),
    ("MEGA", 6, "M"),
    ("KILO", 3, "k"),
    ("HECTO", 2, "h"),
    ("DECA", 1, "da"),
    ("DECI", -1, "d"),
    ("CENTI", -2, "c"),
    ("MILLI", -3, "m"),
    ("MICRO", -6, "µ"),
    ("NANO", -9, "n"),
    ("PICO", -12, "p"),
    ("FEMTO", -15, "f"),
    ("ATTO", -18, "a"),
];

pub fn prefix_exponent(prefix: &str) -> Option<i32> {
    SI_PREFIXES
        .iter()
        .find(|(name, _, _)| name.eq_ignore_ascii_case(prefix))
        .map(|(_, exp, _)| *exp)
}

fn prefix_symbol(prefix: &str) -> &'static str {
    SI_PREFIXES
        .iter()
        .find(|(name, _, _)| name.eq_ignore_ascii_case(prefix))
        .map(|(_, _, symbol)| *symbol)
        .unwrap_or("")
}

/// Correctly rounded power of ten
///
/// Non-negative powers up to 22 are exact in f64; negative ones are one
/// correctly rounded division.
fn pow10(exp: i32) -> f64 {
    if exp >= 0 {
        10f64.powi(exp)
    } else {
        1.0 / 10f64.powi(-exp)
    }
}

/// Scale of a (possibly prefixed) SI unit in host terms
///
/// The prefix is raised to the dimension of square and cubic metres, then
/// composed with the host length unit raised to the quantity's length
/// exponent. `GRAM` is the one unprefixed name with a scale of its own.
pub fn si_scale(prefix: Option<&str>, unit_type: &UnitType, internal_units_per_metre: f64) -> f64 {
    si_scale_named(prefix, unit_type, None, internal_units_per_metre)
}

fn si_scale_named(
    prefix: Option<&str>,
    unit_type: &UnitType,
    name: Option<&str>,
    internal_units_per_metre: f64,
) -> f64 {
    let mut exp = prefix.and_then(prefix_exponent).unwrap_or(0) * unit_type.prefix_power();
    if name.is_some_and(|n| n.eq_ignore_ascii_case("GRAM")) {
        exp -= 3;
    }
    let geometric = match unit_type.length_exponent() {
        0 => 1.0,
        n => internal_units_per_metre.powi(n),
    };
    pow10(exp) * geometric
}

fn si_name_symbol(name: &str) -> &'static str {
    match name.to_ascii_uppercase().as_str() {
        "METRE" => "m",
        "SQUARE_METRE" => "m²",
        "CUBIC_METRE" => "m³",
        "GRAM" => "g",
        "SECOND" => "s",
        "RADIAN" => "rad",
        "STERADIAN" => "sr",
        "KELVIN" => "K",
        "DEGREE_CELSIUS" => "°C",
        "AMPERE" => "A",
        "CANDELA" => "cd",
        "MOLE" => "mol",
        "NEWTON" => "N",
        "PASCAL" => "Pa",
        "WATT" => "W",
        "JOULE" => "J",
        "LUX" => "lx",
        "LUMEN" => "lm",
        "HERTZ" => "Hz",
        "VOLT" => "V",
        _ => "",
    }
}

const IMPERIAL_NAMES: &[&str] = &[
    "INCH", "FOOT", "YARD", "MILE", "SQUARE INCH", "SQUARE FOOT", "SQUARE YARD", "ACRE",
    "CUBIC INCH", "CUBIC FOOT", "CUBIC YARD", "GALLON", "POUND", "OUNCE", "FAHRENHEIT",
];

fn is_imperial(name: &str) -> bool {
    let upper = name.to_ascii_uppercase().replace('_', " ");
    IMPERIAL_NAMES.iter().any(|n| upper.contains(n))
}

/// Supported derived quantities by their (unit type, exponent) multiset
///
/// Element lists are matched exactly after sorting.
const DERIVED_UNITS: &[(&[(UnitTypeKey, i64)], UnitTypeKey)] = &[
    (&[(UnitTypeKey::Length, 1), (UnitTypeKey::Time, -1)], UnitTypeKey::LinearVelocity),
    (&[(UnitTypeKey::Length, -3), (UnitTypeKey::Mass, 1)], UnitTypeKey::MassDensity),
    (&[(UnitTypeKey::Mass, 1), (UnitTypeKey::Volume, -1)], UnitTypeKey::MassDensity),
    (&[(UnitTypeKey::Mass, 1), (UnitTypeKey::Time, -1)], UnitTypeKey::MassFlowRate),
    (&[(UnitTypeKey::Length, 3), (UnitTypeKey::Time, -1)], UnitTypeKey::VolumetricFlowRate),
    (&[(UnitTypeKey::Time, -1), (UnitTypeKey::Volume, 1)], UnitTypeKey::VolumetricFlowRate),
    (
        &[
            (UnitTypeKey::Mass, 1),
            (UnitTypeKey::Time, -3),
            (UnitTypeKey::ThermodynamicTemperature, -1),
        ],
        UnitTypeKey::ThermalTransmittance,
    ),
    (
        &[(UnitTypeKey::Area, -1), (UnitTypeKey::Power, 1), (UnitTypeKey::ThermodynamicTemperature, -1)],
        UnitTypeKey::ThermalTransmittance,
    ),
    (
        &[(UnitTypeKey::Power, 1), (UnitTypeKey::ThermodynamicTemperature, -1)],
        UnitTypeKey::ThermalConductance,
    ),
    (&[(UnitTypeKey::Area, -1), (UnitTypeKey::Power, 1)], UnitTypeKey::HeatFluxDensity),
    (&[(UnitTypeKey::Length, -1), (UnitTypeKey::Force, 1)], UnitTypeKey::LinearForce),
    (&[(UnitTypeKey::Area, -1), (UnitTypeKey::Force, 1)], UnitTypeKey::PlanarForce),
    (&[(UnitTypeKey::Length, 1), (UnitTypeKey::Force, 1)], UnitTypeKey::LinearMoment),
];

/// `UnitType` without payload, usable in the constant table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum UnitTypeKey {
    Length,
    Area,
    Volume,
    Mass,
    Time,
    ThermodynamicTemperature,
    Force,
    Power,
    LinearVelocity,
    MassDensity,
    MassFlowRate,
    VolumetricFlowRate,
    ThermalTransmittance,
    ThermalConductance,
    HeatFluxDensity,
    LinearForce,
    PlanarForce,
    LinearMoment,
}

impl UnitTypeKey {
    fn of(unit_type: &UnitType) -> Option<Self> {
        Some(match unit_type {
            UnitType::Length => UnitTypeKey::Length,
            UnitType::Area => UnitTypeKey::Area,
            UnitType::Volume => UnitTypeKey::Volume,
            UnitType::Mass => UnitTypeKey::Mass,
            UnitType::Time => UnitTypeKey::Time,
            UnitType::ThermodynamicTemperature => UnitTypeKey::ThermodynamicTemperature,
            UnitType::Force => UnitTypeKey::Force,
            UnitType::Power => UnitTypeKey::Power,
            _ => return None,
        })
    }

    fn unit_type(self) -> UnitType {
        match self {
            UnitTypeKey::Length => UnitType::Length,
            UnitTypeKey::Area => UnitType::Area,
            UnitTypeKey::Volume => UnitType::Volume,
            UnitTypeKey::Mass => UnitType::Mass,
            UnitTypeKey::Time => UnitType::Time,
            UnitTypeKey::ThermodynamicTemperature => UnitType::ThermodynamicTemperature,
            UnitTypeKey::Force => UnitType::Force,
            UnitTypeKey::Power => UnitType::Power,
            UnitTypeKey::LinearVelocity => UnitType::LinearVelocity,
            UnitTypeKey::MassDensity => UnitType::MassDensity,
            UnitTypeKey::MassFlowRate => UnitType::MassFlowRate,
            UnitTypeKey::VolumetricFlowRate => UnitType::VolumetricFlowRate,
            UnitTypeKey::ThermalTransmittance => UnitType::ThermalTransmittance,
            UnitTypeKey::ThermalConductance => UnitType::ThermalConductance,
            UnitTypeKey::HeatFluxDensity => UnitType::HeatFluxDensity,
            UnitTypeKey::LinearForce => UnitType::LinearForce,
            UnitTypeKey::PlanarForce => UnitType::PlanarForce,
            UnitTypeKey::LinearMoment => UnitType::LinearMoment,
        }
    }
}

/// Match derived unit elements against the supported quantities
pub fn match_derived(elements: &[(UnitType, i64)]) -> Option<UnitType> {
    let mut keys: Vec<(UnitTypeKey, i64)> = Vec::with_capacity(elements.len());
    for (unit_type, exponent) in elements {
        let key = UnitTypeKey::of(unit_type)?;
        // Repeated base units add their exponents
        match keys.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 += exponent,
            None => keys.push((key, *exponent)),
        }
    }
    keys.retain(|(_, exp)| *exp != 0);
    keys.sort();
    DERIVED_UNITS
        .iter()
        .find(|(pattern, _)| {
            let mut sorted = pattern.to_vec();
            sorted.sort();
            sorted == keys
        })
        .map(|(_, result)| result.unit_type())
}

/// Unit table of one file
#[derive(Debug, Clone)]
pub struct ProjectUnits {
    internal_units_per_metre: f64,
    units: FxHashMap<UnitType, Unit>,
}

impl ProjectUnits {
    /// SI defaults for every quantity
    pub fn new(internal_units_per_metre: f64) -> Self {
        Self {
            internal_units_per_metre,
            units: FxHashMap::default(),
        }
    }

    pub fn set(&mut self, unit: Unit) {
        self.units.insert(unit.unit_type.clone(), unit);
    }

    /// Declared unit, or the SI default
    pub fn get(&self, unit_type: &UnitType) -> Unit {
        self.units
            .get(unit_type)
            .cloned()
            .unwrap_or_else(|| Unit::si_default(unit_type.clone(), self.internal_units_per_metre))
    }

    pub fn is_declared(&self, unit_type: &UnitType) -> bool {
        self.units.contains_key(unit_type)
    }

    pub fn convert(&self, unit_type: &UnitType, value: f64) -> f64 {
        match self.units.get(unit_type) {
            Some(unit) => unit.convert(value),
            None => value * si_scale(None, unit_type, self.internal_units_per_metre),
        }
    }

    pub fn length_scale(&self) -> f64 {
        self.units
            .get(&UnitType::Length)
            .map(|u| u.scale_factor)
            .unwrap_or(self.internal_units_per_metre)
    }

    pub fn angle_scale(&self) -> f64 {
        self.units
            .get(&UnitType::PlaneAngle)
            .map(|u| u.scale_factor)
            .unwrap_or(1.0)
    }
}

/// Build the unit for a unit record
pub(crate) fn build_unit(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<Unit> {
    let ipm = session.options().internal_units_per_metre;
    match record.ifc_type {
        IfcType::IfcSIUnit => {
            let unit_type = declared_type(record)?;
            let prefix = record.enum_attr("Prefix");
            let name = record
                .enum_attr("Name")
                .ok_or_else(|| ImportError::invalid(record.id, "Name", "missing SI unit name"))?;
            let mut unit = Unit {
                scale_factor: si_scale_named(prefix, &unit_type, Some(name), ipm),
                unit_type,
                offset_factor: 0.0,
                system: UnitSystem::Metric,
                symbol: format!("{}{}", prefix.map(prefix_symbol).unwrap_or(""), si_name_symbol(name)),
            };
            if name.eq_ignore_ascii_case("DEGREE_CELSIUS") {
                unit.offset_factor = -273.15 * unit.scale_factor;
            }
            Ok(unit)
        }
        IfcType::IfcConversionBasedUnit | IfcType::IfcConversionBasedUnitWithOffset => {
            let unit_type = declared_type(record)?;
            let name = record.string_attr("Name").unwrap_or("").to_string();
            let measure = session.record_attr(record, "ConversionFactor")?;
            let value = measure
                .attribute("ValueComponent")
                .and_then(|v| v.as_float())
                .ok_or_else(|| {
                    ImportError::invalid(measure.id, "ValueComponent", "not a number")
                })?;
            let component = session
                .unit(measure.ref_attr("UnitComponent"))
                .ok_or_else(|| ImportError::null(measure.id, "UnitComponent"))?;
            let scale = value * component.scale_factor;
            let offset = record.float_attr("ConversionOffset").unwrap_or(0.0);
            Ok(Unit {
                unit_type,
                scale_factor: scale,
                offset_factor: offset * scale + component.offset_factor,
                system: if is_imperial(&name) {
                    UnitSystem::Imperial
                } else {
                    UnitSystem::Metric
                },
                symbol: name.to_ascii_lowercase(),
            })
        }
        IfcType::IfcContextDependentUnit => {
            let unit_type = declared_type(record)?;
            debug!("{}: context dependent unit taken as unscaled", record.id);
            Ok(Unit {
                unit_type,
                scale_factor: 1.0,
                offset_factor: 0.0,
                system: UnitSystem::Metric,
                symbol: record.string_attr("Name").unwrap_or("").to_string(),
            })
        }
        IfcType::IfcDerivedUnit => build_derived(session, record),
        IfcType::IfcMonetaryUnit => Ok(Unit {
            unit_type: UnitType::Monetary,
            scale_factor: 1.0,
            offset_factor: 0.0,
            system: UnitSystem::Metric,
            symbol: record
                .attribute("Currency")
                .and_then(|v| v.as_enum().or_else(|| v.as_string()))
                .unwrap_or("")
                .to_string(),
        }),
        _ => Err(ImportError::UnhandledSubtype {
            entity: record.id,
            ifc_type: record.ifc_type.class_name().to_string(),
            expected: "unit",
        }),
    }
}

fn declared_type(record: &DecodedEntity) -> Result<UnitType> {
    record
        .enum_attr("UnitType")
        .map(UnitType::parse)
        .ok_or_else(|| ImportError::invalid(record.id, "UnitType", "missing unit type"))
}

fn build_derived(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<Unit> {
    let mut elements = Vec::new();
    let mut scale = 1.0;
    let mut symbols = Vec::new();
    for element_id in record.refs_attr("Elements") {
        let element = session.record(element_id)?;
        let exponent = element
            .integer_attr("Exponent")
            .ok_or_else(|| ImportError::invalid(element_id, "Exponent", "not an integer"))?;
        let unit = session
            .unit(element.ref_attr("Unit"))
            .ok_or_else(|| ImportError::null(element_id, "Unit"))?;
        let power = i32::try_from(exponent)
            .map_err(|_| ImportError::invalid(element_id, "Exponent", "exponent out of range"))?;
        scale *= unit.scale_factor.powi(power);
        symbols.push(if exponent == 1 {
            unit.symbol.clone()
        } else {
            format!("{}^{}", unit.symbol, exponent)
        });
        elements.push((unit.unit_type, exponent));
    }

    let unit_type = match_derived(&elements).ok_or_else(|| {
        ImportError::invalid(
            record.id,
            "Elements",
            format!("unhandled unit type {}", record.enum_attr("UnitType").unwrap_or("?")),
        )
    })?;
    if let Some(declared) = record.enum_attr("UnitType").map(UnitType::parse) {
        if declared != unit_type && !matches!(declared, UnitType::Custom(_)) {
            debug!("{}: derived unit declared {:?} matches {:?}", record.id, declared, unit_type);
        }
    }
    Ok(Unit {
        unit_type,
        scale_factor: scale,
        offset_factor: 0.0,
        system: UnitSystem::Metric,
        symbol: symbols.join("·"),
    })
}

/// Resolve the units the project assigns
///
/// Uses the project's `UnitsInContext`, or the first unit assignment in the
/// file when there is no project. Units that fail to resolve leave the SI
/// default in place.
pub(crate) fn resolve_project_units(session: &mut ImportSession<'_>) -> ProjectUnits {
    let resolver = session.resolver();
    let assignment: Option<EntityId> = resolver
        .ids_of_subtype(&IfcType::IfcProject)
        .first()
        .and_then(|&project| resolver.get(project))
        .and_then(|project| project.ref_attr("UnitsInContext"))
        .or_else(|| resolver.ids_by_type(&IfcType::IfcUnitAssignment).first().copied());

    let mut units = ProjectUnits::new(session.options().internal_units_per_metre);
    let Some(assignment) = assignment.and_then(|id| resolver.get(id)) else {
        session
            .log()
            .warning(None, "no unit assignment found, using SI units");
        return units;
    };
    for unit_id in assignment.refs_attr("Units") {
        if let Some(unit) = session.unit(Some(unit_id)) {
            debug!("{unit_id}: {:?} unit scale {}", unit.unit_type, unit.scale_factor);
            units.set(unit);
        }
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ImportOptions;
    use approx::assert_relative_eq;
    use ifc_bridge_parser::StepStore;

    fn store(data: &str) -> StepStore {
        StepStore::parse(format!(
            "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC2X3'));\nENDSEC;\nDATA;\n{data}\nENDSEC;\nEND-ISO-10303-21;\n"
        ))
        .unwrap()
    }

    #[test]
    fn test_prefix_scale_is_exact() {
        assert_eq!(si_scale(Some("MILLI"), &UnitType::Length, 1.0), 0.001);
        assert_eq!(si_scale(Some("MILLI"), &UnitType::Area, 1.0), 1e-6);
        assert_eq!(si_scale(Some("CENTI"), &UnitType::Volume, 1.0), 1e-6);
        assert_eq!(si_scale(Some("KILO"), &UnitType::Force, 1.0), 1000.0);
        assert_eq!(si_scale(Some("EXA"), &UnitType::Time, 1.0), 1e18);
        assert_eq!(si_scale(Some("ATTO"), &UnitType::Time, 1.0), 1e-18);
    }

    #[test]
    fn test_geometric_scale_follows_dimension() {
        let ipm = 1000.0;
        assert_eq!(si_scale(None, &UnitType::Length, ipm), 1000.0);
        assert_eq!(si_scale(None, &UnitType::Area, ipm), 1e6);
        assert_eq!(si_scale(None, &UnitType::Volume, ipm), 1e9);
        assert_eq!(si_scale(None, &UnitType::Pressure, ipm), 1e-3);
        assert_eq!(si_scale(None, &UnitType::Illuminance, ipm), 1e-6);
        assert_eq!(si_scale(None, &UnitType::Mass, ipm), 1.0);
    }

    #[test]
    fn test_convert_round_trip() {
        let unit = Unit {
            unit_type: UnitType::ThermodynamicTemperature,
            scale_factor: 5.0 / 9.0,
            offset_factor: -255.372,
            system: UnitSystem::Imperial,
            symbol: "°f".to_string(),
        };
        for x in [-40.0, 0.0, 32.0, 212.0, 1e6] {
            assert_relative_eq!(unit.convert(unit.inverse_convert(x)), x, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_derived_multiset_match() {
        let u_value = [
            (UnitType::ThermodynamicTemperature, -1),
            (UnitType::Mass, 1),
            (UnitType::Time, -3),
        ];
        assert_eq!(match_derived(&u_value), Some(UnitType::ThermalTransmittance));

        // Same base unit twice folds into one exponent
        let velocity = [(UnitType::Length, 1), (UnitType::Time, -2), (UnitType::Time, 1)];
        assert_eq!(match_derived(&velocity), Some(UnitType::LinearVelocity));

        assert_eq!(match_derived(&[(UnitType::Mass, 2)]), None);
        assert_eq!(match_derived(&[(UnitType::PlaneAngle, 1), (UnitType::Time, -1)]), None);
    }

    #[test]
    fn test_file_units_resolve_once() {
        let store = store(
            "#1=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#2=IFCSIUNIT(*,.PLANEANGLEUNIT.,$,.RADIAN.);
#3=IFCMEASUREWITHUNIT(IFCPLANEANGLEMEASURE(0.017453292519943295),#2);
#4=IFCDIMENSIONALEXPONENTS(0,0,0,0,0,0,0);
#5=IFCCONVERSIONBASEDUNIT(#4,.PLANEANGLEUNIT.,'DEGREE',#3);
#6=IFCSIUNIT(*,.MASSUNIT.,.KILO.,.GRAM.);
#7=IFCSIUNIT(*,.TIMEUNIT.,$,.SECOND.);
#8=IFCSIUNIT(*,.THERMODYNAMICTEMPERATUREUNIT.,$,.KELVIN.);
#9=IFCDERIVEDUNITELEMENT(#6,1);
#10=IFCDERIVEDUNITELEMENT(#8,-1);
#11=IFCDERIVEDUNITELEMENT(#7,-3);
#12=IFCDERIVEDUNIT((#9,#10,#11),.THERMALTRANSMITTANCEUNIT.,$);
#13=IFCUNITASSIGNMENT((#1,#5,#12));",
        );
        let options = ImportOptions::default().with_internal_units_per_metre(1000.0);
        let mut session = ImportSession::new(&store, options).unwrap();
        let units = session.units().clone();

        assert_relative_eq!(units.length_scale(), 1.0);
        assert_relative_eq!(units.angle_scale(), std::f64::consts::PI / 180.0);
        assert_eq!(units.get(&UnitType::Mass).scale_factor, 1.0);
        assert!(units.is_declared(&UnitType::ThermalTransmittance));
        assert_eq!(units.get(&UnitType::Length).symbol, "mm");
        assert_eq!(units.get(&UnitType::PlaneAngle).symbol, "degree");

        let first = session.process_unit(Some(EntityId(1))).unwrap();
        let second = session.process_unit(Some(EntityId(1))).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unmatched_derived_unit_is_diagnosed() {
        let store = store(
            "#1=IFCSIUNIT(*,.MASSUNIT.,.KILO.,.GRAM.);
#2=IFCDERIVEDUNITELEMENT(#1,2);
#3=IFCDERIVEDUNIT((#2),.USERDEFINED.,'kg2');
#4=IFCUNITASSIGNMENT((#3));",
        );
        let session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        assert!(!session.units().is_declared(&UnitType::Custom("USERDEFINED".into())));
        assert!(session
            .diagnostics()
            .for_entity(EntityId(3))
            .any(|d| d.message.contains("unhandled unit type")));
    }

    #[test]
    fn test_oversized_exponent_is_rejected() {
        let store = store(
            "#1=IFCSIUNIT(*,.MASSUNIT.,.KILO.,.GRAM.);
#2=IFCDERIVEDUNITELEMENT(#1,4294967297);
#3=IFCDERIVEDUNIT((#2),.MASSDENSITYUNIT.,$);
#4=IFCUNITASSIGNMENT((#3));",
        );
        let session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        assert!(!session.units().is_declared(&UnitType::MassDensity));
        assert!(session
            .diagnostics()
            .entries()
            .iter()
            .any(|d| d.message.contains("exponent out of range")));
    }

    #[test]
    fn test_missing_assignment_defaults_to_si() {
        let store = store("#1=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);");
        let session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        assert_eq!(session.units().length_scale(), 1.0);
        assert_eq!(session.diagnostics().len(), 1);
    }
}
