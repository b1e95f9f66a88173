//! Приведение полей формы администратора к типам реестра.
//!
//! Числовые поля принимаются и как JSON-числа, и как строки. Пустая строка
//! означает "не передано"; непустая строка, которая не разбирается,
//! даёт ошибку валидации с именем поля.

use crate::error::AppError;
use crate::services::registry_service::NewServer;
use serde::Deserialize;

/// Значение поля формы до приведения типа.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

/// Тело POST /api/v1/servers.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateServerRequest {
    pub name: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub ip_address: Option<String>,
    pub port: Option<FormValue>,
    pub latitude: Option<FormValue>,
    pub longitude: Option<FormValue>,
    pub config_type: Option<String>,
    pub config_data: Option<String>,
    pub ssh_host: Option<String>,
    pub ssh_port: Option<FormValue>,
    pub ssh_user: Option<String>,
    pub ping_ms: Option<FormValue>,
    pub bandwidth_mbps: Option<FormValue>,
    pub max_users: Option<FormValue>,
}

impl CreateServerRequest {
    pub fn into_new_server(self) -> Result<NewServer, AppError> {
        Ok(NewServer {
            port: int_field("port", self.port)?,
            latitude: float_field("latitude", self.latitude)?,
            longitude: float_field("longitude", self.longitude)?,
            ssh_port: int_field("ssh_port", self.ssh_port)?,
            ping_ms: int_field("ping_ms", self.ping_ms)?,
            bandwidth_mbps: int_field("bandwidth_mbps", self.bandwidth_mbps)?,
            max_users: int_field("max_users", self.max_users)?,
            name: self.name,
            country: self.country,
            city: self.city,
            ip_address: self.ip_address,
            config_type: self.config_type,
            config_data: self.config_data,
            ssh_host: self.ssh_host,
            ssh_user: self.ssh_user,
        })
    }
}

/// Разобрать целочисленное поле.
pub fn int_field(field: &str, value: Option<FormValue>) -> Result<Option<i64>, AppError> {
    match value {
        None => Ok(None),
        Some(FormValue::Int(v)) => Ok(Some(v)),
        Some(FormValue::Float(v)) => {
            if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
                Ok(Some(v as i64))
            } else {
                Err(AppError::validation(
                    field,
                    format!("ожидается целое число, получено {v}"),
                ))
            }
        }
        Some(FormValue::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<i64>().map(Some).map_err(|_| {
                AppError::validation(field, format!("ожидается целое число, получено '{s}'"))
            })
        }
        Some(FormValue::Bool(_)) => Err(AppError::validation(field, "ожидается целое число")),
    }
}

/// Разобрать поле с плавающей точкой. NaN и бесконечности отклоняются.
pub fn float_field(field: &str, value: Option<FormValue>) -> Result<Option<f64>, AppError> {
    let parsed = match value {
        None => return Ok(None),
        Some(FormValue::Int(v)) => v as f64,
        Some(FormValue::Float(v)) => v,
        Some(FormValue::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<f64>().map_err(|_| {
                AppError::validation(field, format!("ожидается число, получено '{s}'"))
            })?
        }
        Some(FormValue::Bool(_)) => {
            return Err(AppError::validation(field, "ожидается число"));
        }
    };

    if !parsed.is_finite() {
        return Err(AppError::validation(field, "ожидается конечное число"));
    }
    Ok(Some(parsed))
}

/// Разобрать обязательное числовое поле.
pub fn required_float(field: &str, value: Option<FormValue>) -> Result<f64, AppError> {
    float_field(field, value)?.ok_or_else(|| AppError::validation(field, "обязательное поле"))
}

/// Разобрать флаг `active` из query-строки. Отсутствие или пустое значение означает true.
pub fn active_flag(value: Option<&str>) -> Result<bool, AppError> {
    match value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
    {
        None => Ok(true),
        Some(v) if v == "true" => Ok(true),
        Some(v) if v == "false" => Ok(false),
        Some(v) => Err(AppError::validation(
            "active",
            format!("ожидается true или false, получено '{v}'"),
        )),
    }
}
