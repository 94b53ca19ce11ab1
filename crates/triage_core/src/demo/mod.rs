use rusqlite::Connection;

use crate::domain::{Incident, IncidentStatus, NewIncident};
use crate::error::AppError;
use crate::repo::insert_incident;

/// Six incidents: three reporting apps, each with one pending and one in-progress
/// report. Ids are 1..=6 in insertion order on an empty database.
fn sample_rows() -> Vec<NewIncident> {
    let rows: [(&str, &str, &str, &str, IncidentStatus, &str); 6] = [
        (
            "POS Botillería",
            "Pagos",
            "Terminal rechaza tarjetas de débito",
            "Desde la mañana el terminal de caja 2 rechaza todas las tarjetas de débito con código 05.",
            IncidentStatus::Pending,
            "2026-01-05T09:15:00Z",
        ),
        (
            "POS Botillería",
            "Impresora",
            "Boleta no se imprime",
            "La impresora térmica queda en cola y la venta se registra sin comprobante.",
            IncidentStatus::InProgress,
            "2026-01-05T12:40:00Z",
        ),
        (
            "Car Wash Booking",
            "Reservas",
            "Reserva duplicada para el mismo horario",
            "Dos clientes recibieron confirmación para el box 3 a las 10:00.",
            IncidentStatus::Pending,
            "2026-01-06T08:05:00Z",
        ),
        (
            "Car Wash Booking",
            "Pagos",
            "Pago online no confirmado",
            "El cliente pagó con transferencia pero la reserva sigue como pendiente de pago.",
            IncidentStatus::InProgress,
            "2026-01-06T15:30:00Z",
        ),
        (
            "Inventario Central",
            "Sincronización",
            "Stock desfasado entre sucursales",
            "El conteo de la sucursal norte no coincide con lo informado por el POS.",
            IncidentStatus::Pending,
            "2026-01-07T10:00:00Z",
        ),
        (
            "Inventario Central",
            "Acceso",
            "Error al iniciar sesión",
            "Los bodegueros ven un error 500 al ingresar con su RUT desde la tablet.",
            IncidentStatus::InProgress,
            "2026-01-07T18:20:00Z",
        ),
    ];

    rows.into_iter()
        .map(
            |(project, category, description, full_description, status, date)| NewIncident {
                project: project.to_string(),
                category: category.to_string(),
                description: description.to_string(),
                full_description: full_description.to_string(),
                status,
                date: Some(date.to_string()),
                image: None,
                video: None,
            },
        )
        .collect()
}

/// The demo dataset as plain records (ids assigned 1..=6), for tests and offline use.
pub fn sample_incidents() -> Vec<Incident> {
    sample_rows()
        .into_iter()
        .zip(1..)
        .map(|(row, id)| Incident {
            id,
            project: row.project,
            category: row.category,
            description: row.description,
            full_description: row.full_description,
            status: row.status,
            date: row.date.unwrap_or_default(),
            image: row.image,
            video: row.video,
            comments: String::new(),
            resolved_at: None,
        })
        .collect()
}

pub fn seed_demo_dataset(conn: &mut Connection) -> Result<Vec<Incident>, AppError> {
    let mut out = Vec::new();
    for row in sample_rows() {
        out.push(insert_incident(conn, &row)?);
    }
    Ok(out)
}
