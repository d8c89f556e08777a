//! Translation of listing query parameters into a store query.
//!
//! Clients express filters with bracketed operators in the query string
//! (`beds[gte]=50&state[in]=KA,TN`). Every parameter other than the reserved
//! `select`, `sort`, `limit` and `page` names a filter field, which must be
//! present in the [`FieldSchema`] allow-list; its value is coerced to the
//! declared [`FieldKind`] before it reaches the store.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::slug::deslugify;

pub const RESERVED_PARAMS: [&str; 4] = ["select", "sort", "limit", "page"];

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 100;
pub const MAX_LIMIT: u64 = 1_000;

/// Parameter whose value arrives slugified and is matched de-slugified.
const HOSPITAL_SLUG_PARAM: &str = "hospital";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum QueryError {
    #[error("Unknown filter field '{0}'")]
    UnknownField(String),
    #[error("Unsupported operator '{op}' on field '{field}'")]
    UnsupportedOperator { field: String, op: String },
    #[error("Invalid {kind} value '{value}' for field '{field}'")]
    InvalidValue {
        field: String,
        kind: FieldKind,
        value: String,
    },
    #[error("Operator '{op}' given more than once on field '{field}'")]
    DuplicateOperator { field: String, op: CmpOp },
    #[error("Cannot mix included and excluded fields in select")]
    MixedProjection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Bool,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Bool => "bool",
        })
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "string" => Ok(FieldKind::Text),
            "number" | "num" => Ok(FieldKind::Number),
            "bool" | "boolean" => Ok(FieldKind::Bool),
            other => Err(format!("unknown field kind '{other}' (expected text, number or bool)")),
        }
    }
}

/// Parses a `name:kind` pair as given to `--filter-field`.
pub fn parse_field_spec(s: &str) -> Result<(String, FieldKind), String> {
    let (name, kind) = s
        .split_once(':')
        .ok_or_else(|| format!("expected name:kind, got '{s}'"))?;
    let name = name.trim();
    if !is_valid_field_name(name) {
        return Err(format!("invalid field name '{name}'"));
    }
    Ok((name.to_string(), kind.parse()?))
}

fn is_valid_field_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('$')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Allow-list of filterable fields and their value kinds.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    fields: BTreeMap<String, FieldKind>,
}

impl FieldSchema {
    pub fn hospitals() -> Self {
        let mut schema = Self::default();
        for name in [
            "name",
            HOSPITAL_SLUG_PARAM,
            "address",
            "city",
            "district",
            "state",
            "pincode",
            "category",
            "type",
            "phone",
            "email",
            "website",
            "specialities",
        ] {
            schema.insert(name, FieldKind::Text);
        }
        schema.insert("beds", FieldKind::Number);
        schema.insert("rating", FieldKind::Number);
        schema.insert("emergency", FieldKind::Bool);
        schema
    }

    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.insert(name, kind);
        self
    }

    fn insert(&mut self, name: impl Into<String>, kind: FieldKind) {
        self.fields.insert(name.into(), kind);
    }

    pub fn kind(&self, field: &str) -> Option<FieldKind> {
        self.fields.get(field).copied()
    }

    /// Fields usable in `select` and `sort`: the filterable ones plus the
    /// document id and the geo point.
    fn is_selectable(&self, field: &str) -> bool {
        field == "_id" || field == "location" || self.fields.contains_key(field)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Scalar {
    fn coerce(field: &str, kind: FieldKind, raw: &str) -> Result<Self, QueryError> {
        let invalid = || QueryError::InvalidValue {
            field: field.to_string(),
            kind,
            value: raw.to_string(),
        };
        match kind {
            FieldKind::Text => Ok(Scalar::Text(raw.to_string())),
            FieldKind::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Scalar::Number)
                .ok_or_else(invalid),
            FieldKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Scalar::Bool(true)),
                "false" | "0" => Ok(Scalar::Bool(false)),
                _ => Err(invalid()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CmpOp::Gt => "gt",
            CmpOp::Gte => "gte",
            CmpOp::Lt => "lt",
            CmpOp::Lte => "lte",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Cmp(CmpOp),
    In,
}

impl Operator {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "gt" => Operator::Cmp(CmpOp::Gt),
            "gte" => Operator::Cmp(CmpOp::Gte),
            "lt" => Operator::Cmp(CmpOp::Lt),
            "lte" => Operator::Cmp(CmpOp::Lte),
            "in" => Operator::In,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Scalar),
    /// Conjunction of range bounds and/or a membership test.
    Ops {
        cmp: Vec<(CmpOp, Scalar)>,
        any_of: Option<Vec<Scalar>>,
    },
}

/// Conjunction of per-field conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub fields: BTreeMap<String, Condition>,
}

impl Filter {
    fn add(&mut self, field: &str, op: Option<Operator>, values: Vec<Scalar>) -> Result<(), QueryError> {
        let Some(existing) = self.fields.get_mut(field) else {
            let cond = match op {
                None => match <[Scalar; 1]>::try_from(values) {
                    Ok([v]) => Condition::Eq(v),
                    Err(values) => Condition::Ops {
                        cmp: Vec::new(),
                        any_of: Some(values),
                    },
                },
                Some(Operator::In) => Condition::Ops {
                    cmp: Vec::new(),
                    any_of: Some(values),
                },
                Some(Operator::Cmp(c)) => Condition::Ops {
                    cmp: values.into_iter().map(|v| (c, v)).collect(),
                    any_of: None,
                },
            };
            self.fields.insert(field.to_string(), cond);
            return Ok(());
        };

        // Any further clause widens an exact match into a one-element
        // membership test, so clause order never matters.
        if let Condition::Eq(prev) = &*existing {
            let any_of = vec![prev.clone()];
            *existing = Condition::Ops {
                cmp: Vec::new(),
                any_of: Some(any_of),
            };
        }
        let Condition::Ops { cmp, any_of } = existing else {
            return Ok(());
        };
        match op {
            None | Some(Operator::In) => any_of.get_or_insert_with(Vec::new).extend(values),
            Some(Operator::Cmp(c)) => {
                if cmp.iter().any(|(prev, _)| *prev == c) {
                    return Err(QueryError::DuplicateOperator {
                        field: field.to_string(),
                        op: c,
                    });
                }
                cmp.extend(values.into_iter().map(|v| (c, v)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Projection {
    fn parse(raw: &str, schema: &FieldSchema) -> Result<Option<Self>, QueryError> {
        let mut out = Projection::default();
        for part in split_list(raw) {
            let (field, excluded) = match part.strip_prefix('-') {
                Some(f) => (f, true),
                None => (part, false),
            };
            if !schema.is_selectable(field) {
                return Err(QueryError::UnknownField(field.to_string()));
            }
            if excluded {
                out.exclude.push(field.to_string());
            } else {
                out.include.push(field.to_string());
            }
        }
        // `-_id` is the one exclusion allowed alongside inclusions.
        if !out.include.is_empty() && out.exclude.iter().any(|f| f != "_id") {
            return Err(QueryError::MixedProjection);
        }
        if out.include.is_empty() && out.exclude.is_empty() {
            return Ok(None);
        }
        Ok(Some(out))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub order: Order,
}

fn parse_sort(raw: &str, schema: &FieldSchema) -> Result<Vec<SortKey>, QueryError> {
    split_list(raw)
        .map(|part| {
            let (field, order) = match part.strip_prefix('-') {
                Some(f) => (f, Order::Desc),
                None => (part.strip_prefix('+').unwrap_or(part), Order::Asc),
            };
            if !schema.is_selectable(field) {
                return Err(QueryError::UnknownField(field.to_string()));
            }
            Ok(SortKey {
                field: field.to_string(),
                order,
            })
        })
        .collect()
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|p| !p.is_empty())
}

/// One page of a listing, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    /// Missing, non-numeric or non-positive inputs fall back to the defaults
    /// instead of failing the request.
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        let positive = |s: Option<&str>| s.and_then(parse_int_prefix).filter(|n| *n > 0);
        Self {
            page: positive(page).map_or(DEFAULT_PAGE, |n| n as u64),
            limit: positive(limit).map_or(DEFAULT_LIMIT, |n| (n as u64).min(MAX_LIMIT)),
        }
    }

    /// Capped at `i64::MAX`, the largest skip MongoDB accepts.
    pub fn start_index(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit).min(i64::MAX as u64)
    }

    pub fn end_index(&self) -> u64 {
        self.page.saturating_mul(self.limit)
    }

    pub fn pagination(&self, total: u64) -> Pagination {
        Pagination {
            next: (self.end_index() < total).then_some(PageRef {
                page: self.page + 1,
                limit: self.limit,
            }),
            prev: (self.start_index() > 0).then_some(PageRef {
                page: self.page - 1,
                limit: self.limit,
            }),
        }
    }
}

/// Leading integer of `s`, ignoring anything after the digits
/// (`"12abc"` -> 12).
fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    // Saturate absurdly long inputs rather than rejecting them.
    let n = rest[..digits].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * n)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

/// Everything a store needs to run one listing request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub filter: Filter,
    pub projection: Option<Projection>,
    pub sort: Vec<SortKey>,
    pub page: Page,
}

impl ListQuery {
    /// Builds a query from raw `(name, value)` pairs in request order. For
    /// repeated reserved parameters the last occurrence wins.
    pub fn from_params(params: &[(String, String)], schema: &FieldSchema) -> Result<Self, QueryError> {
        let reserved = |name: &str| {
            params
                .iter()
                .rev()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };

        let mut filter = Filter::default();
        for (key, value) in params {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                continue;
            }
            let (field, op) = split_key(key)?;
            let kind = schema
                .kind(field)
                .ok_or_else(|| QueryError::UnknownField(field.to_string()))?;
            let value = if field == HOSPITAL_SLUG_PARAM {
                deslugify(value)
            } else {
                value.clone()
            };
            let values = match op {
                Some(Operator::In) => split_list(&value)
                    .map(|v| Scalar::coerce(field, kind, v))
                    .collect::<Result<Vec<_>, _>>()?,
                _ => vec![Scalar::coerce(field, kind, &value)?],
            };
            filter.add(field, op, values)?;
        }

        let projection = match reserved("select") {
            Some(raw) => Projection::parse(raw, schema)?,
            None => None,
        };
        let sort = match reserved("sort") {
            Some(raw) => parse_sort(raw, schema)?,
            None => Vec::new(),
        };
        let page = Page::from_params(reserved("page"), reserved("limit"));

        Ok(Self {
            filter,
            projection,
            sort,
            page,
        })
    }
}

/// Splits `field[op]` (or the array form `field[op][]`) into its parts.
fn split_key(key: &str) -> Result<(&str, Option<Operator>), QueryError> {
    let key = key.strip_suffix("[]").unwrap_or(key);
    let Some((field, rest)) = key.split_once('[') else {
        return Ok((key, None));
    };
    let op_name = rest.strip_suffix(']').unwrap_or(rest);
    let op = Operator::parse(op_name).ok_or_else(|| QueryError::UnsupportedOperator {
        field: field.to_string(),
        op: op_name.to_string(),
    })?;
    Ok((field, Some(op)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn translate(pairs: &[(&str, &str)]) -> Result<ListQuery, QueryError> {
        ListQuery::from_params(&params(pairs), &FieldSchema::hospitals())
    }

    #[test]
    fn empty_params_use_defaults() {
        let q = translate(&[]).unwrap();
        assert!(q.filter.fields.is_empty());
        assert_eq!(q.projection, None);
        assert!(q.sort.is_empty());
        assert_eq!(q.page, Page { page: 1, limit: 100 });
    }

    #[test]
    fn reserved_params_never_become_filters() {
        let q = translate(&[
            ("select", "name"),
            ("sort", "name"),
            ("limit", "5"),
            ("page", "2"),
            ("city", "Pune"),
        ])
        .unwrap();
        assert_eq!(q.filter.fields.len(), 1);
        assert_eq!(
            q.filter.fields["city"],
            Condition::Eq(Scalar::Text("Pune".into()))
        );
    }

    #[test]
    fn bracket_operators_become_comparisons() {
        let schema = FieldSchema::hospitals().with_field("age", FieldKind::Number);
        let q = ListQuery::from_params(&params(&[("age[gte]", "5")]), &schema).unwrap();
        assert_eq!(
            q.filter.fields["age"],
            Condition::Ops {
                cmp: vec![(CmpOp::Gte, Scalar::Number(5.0))],
                any_of: None,
            }
        );
    }

    #[test]
    fn operator_words_inside_field_names_are_untouched() {
        let schema = FieldSchema::hospitals()
            .with_field("intake", FieldKind::Number)
            .with_field("ltc_unit", FieldKind::Text);
        let q = ListQuery::from_params(
            &params(&[("intake", "3"), ("ltc_unit", "gt"), ("beds[lt]", "40")]),
            &schema,
        )
        .unwrap();
        assert_eq!(q.filter.fields["intake"], Condition::Eq(Scalar::Number(3.0)));
        assert_eq!(
            q.filter.fields["ltc_unit"],
            Condition::Eq(Scalar::Text("gt".into()))
        );
        assert_eq!(
            q.filter.fields["beds"],
            Condition::Ops {
                cmp: vec![(CmpOp::Lt, Scalar::Number(40.0))],
                any_of: None,
            }
        );
    }

    #[test]
    fn range_and_membership_combine_on_one_field() {
        let q = translate(&[
            ("beds[gt]", "10"),
            ("beds[lte]", "200"),
            ("state[in]", "KA, TN"),
            ("state[in][]", "KL"),
        ])
        .unwrap();
        assert_eq!(
            q.filter.fields["beds"],
            Condition::Ops {
                cmp: vec![
                    (CmpOp::Gt, Scalar::Number(10.0)),
                    (CmpOp::Lte, Scalar::Number(200.0)),
                ],
                any_of: None,
            }
        );
        assert_eq!(
            q.filter.fields["state"],
            Condition::Ops {
                cmp: vec![],
                any_of: Some(vec![
                    Scalar::Text("KA".into()),
                    Scalar::Text("TN".into()),
                    Scalar::Text("KL".into()),
                ]),
            }
        );
    }

    #[test]
    fn repeated_plain_key_is_membership() {
        let q = translate(&[("city", "Pune"), ("city", "Goa")]).unwrap();
        assert_eq!(
            q.filter.fields["city"],
            Condition::Ops {
                cmp: vec![],
                any_of: Some(vec![Scalar::Text("Pune".into()), Scalar::Text("Goa".into())]),
            }
        );
    }

    #[test]
    fn unknown_operator_is_rejected() {
        assert_eq!(
            translate(&[("beds[ne]", "3")]),
            Err(QueryError::UnsupportedOperator {
                field: "beds".into(),
                op: "ne".into(),
            })
        );
        assert!(matches!(
            translate(&[("beds[$where]", "1")]),
            Err(QueryError::UnsupportedOperator { .. })
        ));
    }

    #[test]
    fn fields_outside_allow_list_are_rejected() {
        assert_eq!(
            translate(&[("$where", "1")]),
            Err(QueryError::UnknownField("$where".into()))
        );
        assert_eq!(
            translate(&[("select", "name,password")]),
            Err(QueryError::UnknownField("password".into()))
        );
        assert_eq!(
            translate(&[("sort", "-secret")]),
            Err(QueryError::UnknownField("secret".into()))
        );
    }

    #[test]
    fn values_are_coerced_per_kind() {
        let q = translate(&[("emergency", "TRUE"), ("rating[gte]", "4.5")]).unwrap();
        assert_eq!(q.filter.fields["emergency"], Condition::Eq(Scalar::Bool(true)));
        assert!(matches!(
            translate(&[("beds", "many")]),
            Err(QueryError::InvalidValue { kind: FieldKind::Number, .. })
        ));
        assert!(matches!(
            translate(&[("emergency", "maybe")]),
            Err(QueryError::InvalidValue { kind: FieldKind::Bool, .. })
        ));
    }

    #[test]
    fn exact_match_combines_with_operators_in_any_order() {
        let expected = Condition::Ops {
            cmp: vec![(CmpOp::Gt, Scalar::Text("A".into()))],
            any_of: Some(vec![Scalar::Text("Pune".into())]),
        };
        for pairs in [
            &[("city", "Pune"), ("city[gt]", "A")][..],
            &[("city[gt]", "A"), ("city", "Pune")][..],
        ] {
            assert_eq!(translate(pairs).unwrap().filter.fields["city"], expected);
        }

        let q = translate(&[("city", "Pune"), ("city", "Goa"), ("city[gt]", "A")]).unwrap();
        assert_eq!(
            q.filter.fields["city"],
            Condition::Ops {
                cmp: vec![(CmpOp::Gt, Scalar::Text("A".into()))],
                any_of: Some(vec![Scalar::Text("Pune".into()), Scalar::Text("Goa".into())]),
            }
        );
        let q = translate(&[("city", "Pune"), ("city[in]", "Goa")]).unwrap();
        assert_eq!(
            q.filter.fields["city"],
            Condition::Ops {
                cmp: vec![],
                any_of: Some(vec![Scalar::Text("Pune".into()), Scalar::Text("Goa".into())]),
            }
        );
    }

    #[test]
    fn repeated_comparison_is_rejected() {
        assert!(matches!(
            translate(&[("beds[gt]", "1"), ("beds[gt]", "2")]),
            Err(QueryError::DuplicateOperator { op: CmpOp::Gt, .. })
        ));
        assert!(matches!(
            translate(&[("beds", "5"), ("beds[lt]", "9"), ("beds[lt]", "7")]),
            Err(QueryError::DuplicateOperator { op: CmpOp::Lt, .. })
        ));
    }

    #[test]
    fn hospital_slug_is_deslugified() {
        let q = translate(&[("hospital", "city-care-clinic")]).unwrap();
        assert_eq!(
            q.filter.fields["hospital"],
            Condition::Eq(Scalar::Text("City Care Clinic".into()))
        );
    }

    #[test]
    fn select_and_sort_keep_order() {
        let q = translate(&[("select", "name,location"), ("sort", "-rating,name")]).unwrap();
        assert_eq!(
            q.projection,
            Some(Projection {
                include: vec!["name".into(), "location".into()],
                exclude: vec![],
            })
        );
        assert_eq!(
            q.sort,
            vec![
                SortKey { field: "rating".into(), order: Order::Desc },
                SortKey { field: "name".into(), order: Order::Asc },
            ]
        );
    }

    #[test]
    fn projection_rules() {
        assert_eq!(translate(&[("select", " , ")]).unwrap().projection, None);
        assert!(translate(&[("select", "name,-_id")]).is_ok());
        assert_eq!(
            translate(&[("select", "name,-city")]),
            Err(QueryError::MixedProjection)
        );
        let q = translate(&[("select", "-phone,-email")]).unwrap();
        assert_eq!(
            q.projection.unwrap().exclude,
            vec!["phone".to_string(), "email".to_string()]
        );
    }

    #[test]
    fn page_and_limit_are_lenient() {
        assert_eq!(Page::from_params(Some("abc"), Some("")), Page::default());
        assert_eq!(Page::from_params(Some("0"), Some("-4")), Page::default());
        assert_eq!(
            Page::from_params(Some("3abc"), Some(" 7 items")),
            Page { page: 3, limit: 7 }
        );
        assert_eq!(Page::from_params(None, Some("50000")).limit, MAX_LIMIT);
        assert_eq!(
            Page::from_params(Some("99999999999999999999999"), None).page,
            i64::MAX as u64
        );
    }

    #[test]
    fn pagination_descriptors() {
        let first = Page::default();
        assert_eq!(first.pagination(100), Pagination::default());
        assert_eq!(
            first.pagination(101).next,
            Some(PageRef { page: 2, limit: 100 })
        );

        let second = Page { page: 2, limit: 5 };
        assert_eq!(second.start_index(), 5);
        assert_eq!(second.end_index(), 10);
        let p = second.pagination(12);
        assert_eq!(p.prev, Some(PageRef { page: 1, limit: 5 }));
        assert_eq!(p.next, Some(PageRef { page: 3, limit: 5 }));
        assert_eq!(second.pagination(10).next, None);
    }

    #[test]
    fn start_index_fits_a_signed_skip() {
        let far = Page::from_params(Some("100000000000000000"), None);
        assert_eq!(far.start_index(), i64::MAX as u64);
        assert!(far.start_index() < far.end_index());
        assert_eq!(far.pagination(3).next, None);
    }

    #[test]
    fn pagination_serializes_only_present_links() {
        let json = serde_json::to_value(Page { page: 2, limit: 5 }.pagination(10)).unwrap();
        assert_eq!(json, serde_json::json!({ "prev": { "page": 1, "limit": 5 } }));
    }

    #[test]
    fn field_specs_parse() {
        assert_eq!(
            parse_field_spec("icu_beds:number"),
            Ok(("icu_beds".to_string(), FieldKind::Number))
        );
        assert!(parse_field_spec("icu_beds").is_err());
        assert!(parse_field_spec("$x:text").is_err());
        assert!(parse_field_spec("x:date").is_err());
    }
}
