//! Lecture et écriture GeoParquet (colonne géométrie en WKB)
//!
//! Disponible uniquement avec le feature `parquet`.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use geozero::wkb::Wkb;
use geozero::{CoordDimensions, ToGeo, ToWkb};
use parquet::basic::{ConvertedType, Repetition, Type as PhysicalType};
use parquet::data_type::{BoolType, ByteArray, ByteArrayType, DoubleType, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::writer::SerializedFileWriter;
use parquet::record::Field;
use parquet::schema::types::Type;
use serde_json::Value;
use tracing::{debug, info};

use crate::types::{property_text, Feature};
use crate::GeoFormatError;

/// Nom de colonne géométrie par défaut (GeoPandas `to_parquet`)
pub const DEFAULT_GEOMETRY_COLUMN: &str = "geometry";

/// Lit un fichier GeoParquet
///
/// La colonne `geometry_column` doit contenir du WKB; les autres colonnes
/// primitives deviennent des attributs typés. Les lignes sans géométrie
/// sont ignorées.
pub fn read_parquet(path: &Path, geometry_column: &str) -> Result<Vec<Feature>, GeoFormatError> {
    if !path.exists() {
        return Err(GeoFormatError::NotFound(path.to_path_buf()));
    }

    let reader = SerializedFileReader::new(File::open(path)?)?;
    let row_count = reader.metadata().file_metadata().num_rows();
    debug!(path = %path.display(), rows = row_count, "Reading GeoParquet");

    let mut features = Vec::new();
    for row in reader.get_row_iter(None)? {
        let row = row?;

        let mut geometry = None;
        let mut properties = Vec::new();
        for (name, field) in row.get_column_iter() {
            if name == geometry_column {
                if let Field::Bytes(bytes) = field {
                    geometry = Some(Wkb(bytes.data().to_vec()).to_geo()?);
                }
                continue;
            }
            properties.push((name.clone(), field_value(field)));
        }

        let Some(geometry) = geometry else {
            continue;
        };

        let mut feature = Feature::anonymous(geometry);
        feature.properties.extend(properties);
        features.push(feature);
    }

    Ok(features)
}

fn field_value(field: &Field) -> Value {
    match field {
        Field::Null => Value::Null,
        Field::Bool(b) => Value::from(*b),
        Field::Byte(n) => Value::from(*n),
        Field::Short(n) => Value::from(*n),
        Field::Int(n) => Value::from(*n),
        Field::Long(n) => Value::from(*n),
        Field::UByte(n) => Value::from(*n),
        Field::UShort(n) => Value::from(*n),
        Field::UInt(n) => Value::from(*n),
        Field::ULong(n) => Value::from(*n),
        Field::Float(x) => Value::from(f64::from(*x)),
        Field::Double(x) => Value::from(*x),
        Field::Str(s) => Value::from(s.as_str()),
        other => Value::from(other.to_string()),
    }
}

/// Type de colonne déduit des valeurs d'un attribut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Boolean,
    Int64,
    Double,
    Utf8,
}

impl ColumnKind {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(Self::Boolean),
            Value::Number(n) if n.is_i64() => Some(Self::Int64),
            Value::Number(_) => Some(Self::Double),
            _ => Some(Self::Utf8),
        }
    }

    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (Self::Int64, Self::Double) | (Self::Double, Self::Int64) => Self::Double,
            _ => Self::Utf8,
        }
    }

    fn physical(self) -> PhysicalType {
        match self {
            Self::Boolean => PhysicalType::BOOLEAN,
            Self::Int64 => PhysicalType::INT64,
            Self::Double => PhysicalType::DOUBLE,
            Self::Utf8 => PhysicalType::BYTE_ARRAY,
        }
    }
}

/// Écrit des features en GeoParquet
///
/// Géométrie en WKB dans `geometry_column`, une colonne optionnelle par
/// attribut. Le type de colonne suit les valeurs (entier, réel, booléen);
/// des valeurs hétérogènes donnent une colonne texte.
pub fn write_parquet(
    features: &[Feature],
    geometry_column: &str,
    path: &Path,
) -> Result<(), GeoFormatError> {
    let mut keys: Vec<&str> = Vec::new();
    for key in features.iter().flat_map(|f| f.properties.keys()) {
        if key.as_str() != geometry_column && !keys.contains(&key.as_str()) {
            keys.push(key.as_str());
        }
    }
    let columns: Vec<(&str, ColumnKind)> = keys
        .into_iter()
        .map(|key| {
            let kind = features
                .iter()
                .filter_map(|f| f.properties.get(key))
                .filter_map(ColumnKind::of)
                .reduce(ColumnKind::merge)
                .unwrap_or(ColumnKind::Utf8);
            (key, kind)
        })
        .collect();

    let mut fields = vec![Arc::new(
        Type::primitive_type_builder(geometry_column, PhysicalType::BYTE_ARRAY)
            .with_repetition(Repetition::REQUIRED)
            .build()?,
    )];
    for (key, kind) in &columns {
        let mut builder = Type::primitive_type_builder(key, kind.physical())
            .with_repetition(Repetition::OPTIONAL);
        if *kind == ColumnKind::Utf8 {
            builder = builder.with_converted_type(ConvertedType::UTF8);
        }
        fields.push(Arc::new(builder.build()?));
    }
    let schema = Type::group_type_builder("schema").with_fields(fields).build()?;

    let geometries = features
        .iter()
        .map(|f| f.geometry.to_wkb(CoordDimensions::xy()).map(ByteArray::from))
        .collect::<Result<Vec<_>, _>>()?;

    let file = File::create(path)?;
    let props = Arc::new(WriterProperties::builder().build());
    let mut writer = SerializedFileWriter::new(file, Arc::new(schema), props)?;
    let mut row_group = writer.next_row_group()?;

    if let Some(mut column) = row_group.next_column()? {
        column
            .typed::<ByteArrayType>()
            .write_batch(&geometries, None, None)?;
        column.close()?;
    }

    for (key, kind) in &columns {
        let Some(mut column) = row_group.next_column()? else {
            break;
        };
        let values: Vec<Option<&Value>> = features
            .iter()
            .map(|f| f.properties.get(*key).filter(|v| !v.is_null()))
            .collect();
        let levels: Vec<i16> = values.iter().map(|v| i16::from(v.is_some())).collect();
        let present = values.iter().flatten();

        match kind {
            ColumnKind::Boolean => {
                let data: Vec<bool> = present.filter_map(|v| v.as_bool()).collect();
                column.typed::<BoolType>().write_batch(&data, Some(&levels), None)?;
            }
            ColumnKind::Int64 => {
                let data: Vec<i64> = present.filter_map(|v| v.as_i64()).collect();
                column.typed::<Int64Type>().write_batch(&data, Some(&levels), None)?;
            }
            ColumnKind::Double => {
                let data: Vec<f64> = present.filter_map(|v| v.as_f64()).collect();
                column.typed::<DoubleType>().write_batch(&data, Some(&levels), None)?;
            }
            ColumnKind::Utf8 => {
                let data: Vec<ByteArray> = present
                    .map(|v| ByteArray::from(property_text(v).into_bytes()))
                    .collect();
                column.typed::<ByteArrayType>().write_batch(&data, Some(&levels), None)?;
            }
        }
        column.close()?;
    }

    row_group.close()?;
    writer.close()?;

    info!(path = %path.display(), features = features.len(), columns = columns.len() + 1, "GeoParquet written");
    Ok(())
}
