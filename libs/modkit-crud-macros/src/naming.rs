//! Pure helpers shared by the derive: column naming and type classification.

use syn::{GenericArgument, PathArguments, PathSegment, Type};

/// Field names that are managed by the repository and never searched.
pub const SYSTEM_TIMESTAMPS: [&str; 3] = ["created_at", "updated_at", "deleted_at"];

/// Logical kind of a model field, mirrored by `modkit_crud::FieldKind`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    String,
    Integer,
    Float,
    Bool,
    Decimal,
    Uuid,
    DateTimeUtc,
    DateTime,
    DateTimeWithTimeZone,
    DateTimeLocal,
    Date,
    Time,
    Json,
    Bytes,
    Collection,
    Other,
}

impl Kind {
    pub fn variant_name(self) -> &'static str {
        match self {
            Kind::String => "String",
            Kind::Integer => "Integer",
            Kind::Float => "Float",
            Kind::Bool => "Bool",
            Kind::Decimal => "Decimal",
            Kind::Uuid => "Uuid",
            Kind::DateTimeUtc => "DateTimeUtc",
            Kind::DateTime => "DateTime",
            Kind::DateTimeWithTimeZone => "DateTimeWithTimeZone",
            Kind::DateTimeLocal => "DateTimeLocal",
            Kind::Date => "Date",
            Kind::Time => "Time",
            Kind::Json => "Json",
            Kind::Bytes => "Bytes",
            Kind::Collection => "Collection",
            Kind::Other => "Other",
        }
    }

    pub fn is_timestamp(self) -> bool {
        matches!(
            self,
            Kind::DateTimeUtc | Kind::DateTime | Kind::DateTimeWithTimeZone | Kind::DateTimeLocal
        )
    }

    /// Scalar and timestamp-like kinds are eligible for text search.
    pub fn is_searchable(self) -> bool {
        !matches!(
            self,
            Kind::Json | Kind::Bytes | Kind::Collection | Kind::Other
        )
    }
}

/// Insert `_` before every upper-case letter except the first, then lower-case.
///
/// `CompanyID` becomes `company_i_d`; identifiers that are already snake case
/// pass through unchanged.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Strip the `r#` prefix of raw identifiers.
pub fn unraw(ident: &str) -> &str {
    ident.strip_prefix("r#").unwrap_or(ident)
}

/// Resolve the storage column of a field.
pub fn resolve_column(
    sea_orm_column: Option<&str>,
    serde_rename: Option<&str>,
    serde_omit: bool,
    ident: &str,
) -> String {
    if let Some(column) = sea_orm_column.filter(|c| !c.is_empty()) {
        return column.to_owned();
    }
    if !serde_omit && let Some(rename) = serde_rename.filter(|r| !r.is_empty()) {
        return rename.to_owned();
    }
    to_snake_case(unraw(ident))
}

/// Classify a field type. The boolean is `true` for `Option<_>` fields.
pub fn classify(ty: &Type) -> (Kind, bool) {
    match option_inner(ty) {
        Some(inner) => (classify_inner(inner), true),
        None => (classify_inner(ty), false),
    }
}

fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let seg = path.path.segments.last()?;
    if seg.ident != "Option" {
        return None;
    }
    first_type_arg(seg)
}

fn first_type_arg(seg: &PathSegment) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(t) => Some(t),
        _ => None,
    })
}

fn last_ident(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(p) => p.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    }
}

fn classify_inner(ty: &Type) -> Kind {
    let path = match ty {
        Type::Reference(r) => return classify_inner(&r.elem),
        Type::Array(_) | Type::Slice(_) | Type::Tuple(_) => return Kind::Collection,
        Type::Path(p) => p,
        _ => return Kind::Other,
    };
    let Some(seg) = path.path.segments.last() else {
        return Kind::Other;
    };

    match seg.ident.to_string().as_str() {
        "String" | "str" => Kind::String,
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
        | "u128" | "usize" => Kind::Integer,
        "f32" | "f64" => Kind::Float,
        "bool" => Kind::Bool,
        "Decimal" => Kind::Decimal,
        "Uuid" => Kind::Uuid,
        "DateTimeUtc" => Kind::DateTimeUtc,
        "DateTimeWithTimeZone" => Kind::DateTimeWithTimeZone,
        "DateTimeLocal" => Kind::DateTimeLocal,
        "NaiveDateTime" => Kind::DateTime,
        // `DateTime` without arguments is the SeaORM prelude alias for `NaiveDateTime`.
        "DateTime" => match first_type_arg(seg).and_then(last_ident).as_deref() {
            None => Kind::DateTime,
            Some("Utc") => Kind::DateTimeUtc,
            Some("FixedOffset") => Kind::DateTimeWithTimeZone,
            Some("Local") => Kind::DateTimeLocal,
            Some(_) => Kind::Other,
        },
        "Date" | "NaiveDate" => Kind::Date,
        "Time" | "NaiveTime" => Kind::Time,
        "Json" | "JsonValue" | "Value" => Kind::Json,
        "Vec" => match first_type_arg(seg).and_then(last_ident).as_deref() {
            Some("u8") => Kind::Bytes,
            _ => Kind::Collection,
        },
        "HashMap" | "BTreeMap" | "HashSet" | "BTreeSet" | "VecDeque" => Kind::Collection,
        _ => Kind::Other,
    }
}
