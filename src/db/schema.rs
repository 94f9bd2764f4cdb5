/// Esquema de la base de gestiones. Todas las sentencias son idempotentes.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS agentes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agente TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS formaspago (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    formapago TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS gestiones (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ngestion INTEGER NOT NULL DEFAULT 0,
    fecha TEXT NOT NULL,
    cliente TEXT NOT NULL DEFAULT '',
    dominio TEXT NOT NULL DEFAULT '',
    poliza TEXT NOT NULL,
    tipo TEXT NOT NULL,
    motivo TEXT NOT NULL DEFAULT '',
    ncaso INTEGER NOT NULL DEFAULT 0,
    usuariocarga TEXT NOT NULL DEFAULT '',
    usuariorespuesta TEXT NOT NULL DEFAULT '',
    estado TEXT,
    itr INTEGER NOT NULL DEFAULT 0,
    totalfactura REAL NOT NULL DEFAULT 0,
    terminado INTEGER NOT NULL DEFAULT 0,
    fechaterminado TEXT,
    obs TEXT NOT NULL DEFAULT '',
    activa INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_gestiones_fecha ON gestiones(fecha);
CREATE INDEX IF NOT EXISTS idx_gestiones_tipo ON gestiones(tipo);

CREATE TABLE IF NOT EXISTS pagos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    gestion_id INTEGER NOT NULL REFERENCES gestiones(id),
    fecha TEXT NOT NULL,
    pagador_id INTEGER NOT NULL REFERENCES agentes(id),
    destinatario_id INTEGER NOT NULL REFERENCES agentes(id),
    formapago_id INTEGER NOT NULL REFERENCES formaspago(id),
    importe REAL NOT NULL CHECK (importe > 0)
);

CREATE INDEX IF NOT EXISTS idx_pagos_gestion ON pagos(gestion_id);

CREATE TABLE IF NOT EXISTS facturas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nrofactura TEXT,
    fechaemitida TEXT NOT NULL,
    periodo INTEGER NOT NULL,
    importe REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS notas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pago_id INTEGER NOT NULL UNIQUE REFERENCES pagos(id),
    factura_id INTEGER REFERENCES facturas(id)
);

CREATE INDEX IF NOT EXISTS idx_notas_factura ON notas(factura_id);

CREATE TABLE IF NOT EXISTS documentos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    titulo TEXT NOT NULL,
    descripcion TEXT,
    nombre_archivo TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    tamano INTEGER NOT NULL,
    hash TEXT NOT NULL UNIQUE,
    ruta TEXT NOT NULL,
    creado_por TEXT,
    creado_en TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS gestion_documento (
    gestion_id INTEGER NOT NULL REFERENCES gestiones(id),
    documento_id INTEGER NOT NULL REFERENCES documentos(id),
    PRIMARY KEY (gestion_id, documento_id)
);
"#;
