//! Course catalog: levels, units, lessons and their quizzes.
//!
//! The catalog is static content loaded once at startup and shared
//! read-only. Lessons are globally ordered (level, unit, lesson) and a
//! lesson unlocks once the one before it is complete.

use serde::Serialize;
use utoipa::ToSchema;

/// One multiple-choice question.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuizQuestion {
    /// Question identifier, unique within the lesson.
    pub id: String,
    /// Question text.
    pub prompt: String,
    /// Answer options.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_option: usize,
    /// Shown after answering.
    pub explanation: String,
}

/// A single lesson.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Lesson {
    /// Slug, unique across the catalog.
    pub id: String,
    /// Title.
    pub title: String,
    /// Short content summary.
    pub summary: String,
    /// XP awarded on completion.
    pub xp_reward: u32,
    /// Requires a premium plan.
    pub premium: bool,
    /// End-of-lesson quiz.
    pub questions: Vec<QuizQuestion>,
}

/// A group of lessons.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Unit {
    /// Slug.
    pub id: String,
    /// Title.
    pub title: String,
    /// Lessons in order.
    pub lessons: Vec<Lesson>,
}

/// A group of units.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Level {
    /// Slug.
    pub id: String,
    /// Title.
    pub title: String,
    /// Units in order.
    pub units: Vec<Unit>,
}

/// A lesson together with the unit and level it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct LessonRef<'a> {
    /// Owning level.
    pub level: &'a Level,
    /// Owning unit.
    pub unit: &'a Unit,
    /// The lesson.
    pub lesson: &'a Lesson,
}

/// The complete course.
#[derive(Debug, Clone)]
pub struct Catalog {
    levels: Vec<Level>,
}

impl Catalog {
    /// Builds a catalog from levels.
    #[must_use]
    pub fn new(levels: Vec<Level>) -> Self {
        Self { levels }
    }

    /// Levels in order.
    #[must_use]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Every lesson with its context, in catalog order.
    pub fn lessons(&self) -> impl Iterator<Item = LessonRef<'_>> {
        self.levels.iter().flat_map(|level| {
            level.units.iter().flat_map(move |unit| {
                unit.lessons
                    .iter()
                    .map(move |lesson| LessonRef { level, unit, lesson })
            })
        })
    }

    /// Looks up a lesson by id.
    #[must_use]
    pub fn lesson(&self, id: &str) -> Option<LessonRef<'_>> {
        self.lessons().find(|r| r.lesson.id == id)
    }

    /// The lesson preceding `id` in catalog order, if any.
    #[must_use]
    pub fn previous_lesson(&self, id: &str) -> Option<&Lesson> {
        let mut previous = None;
        for r in self.lessons() {
            if r.lesson.id == id {
                return previous;
            }
            previous = Some(r.lesson);
        }
        None
    }

    /// Number of lessons in the catalog.
    #[must_use]
    pub fn total_lessons(&self) -> usize {
        self.lessons().count()
    }

    /// The seeded financial-education course.
    #[must_use]
    pub fn seed() -> Self {
        Self::new(vec![
            Level {
                id: "fundamentos".into(),
                title: "Fundamentos financieros".into(),
                units: vec![
                    Unit {
                        id: "presupuesto".into(),
                        title: "Presupuesto".into(),
                        lessons: vec![
                            lesson(
                                "presupuesto-101",
                                "¿Qué es un presupuesto?",
                                "Un plan para decidir a dónde va cada peso antes de gastarlo.",
                                10,
                                false,
                                vec![
                                    question(
                                        "q1",
                                        "¿Cuál es el primer paso para armar un presupuesto?",
                                        &["Conocer tus ingresos", "Pedir un préstamo", "Invertir en bolsa"],
                                        0,
                                        "Sin saber cuánto entra no puedes planear cuánto sale.",
                                    ),
                                    question(
                                        "q2",
                                        "¿Cada cuánto conviene revisar tu presupuesto?",
                                        &["Nunca", "Cada mes", "Cada diez años"],
                                        1,
                                        "Una revisión mensual detecta desviaciones a tiempo.",
                                    ),
                                ],
                            ),
                            lesson(
                                "regla-50-30-20",
                                "La regla 50/30/20",
                                "Necesidades, deseos y ahorro en proporciones simples.",
                                10,
                                false,
                                vec![
                                    question(
                                        "q1",
                                        "Según la regla, ¿qué porcentaje va al ahorro?",
                                        &["50%", "30%", "20%"],
                                        2,
                                        "El 20% se destina a ahorro y pago de deudas.",
                                    ),
                                    question(
                                        "q2",
                                        "La renta de tu vivienda es una...",
                                        &["Necesidad", "Deseo", "Inversión"],
                                        0,
                                        "La vivienda entra en el 50% de necesidades.",
                                    ),
                                    question(
                                        "q3",
                                        "Una suscripción de streaming es un...",
                                        &["Necesidad", "Deseo", "Ahorro"],
                                        1,
                                        "El entretenimiento cae en el 30% de deseos.",
                                    ),
                                ],
                            ),
                        ],
                    },
                    Unit {
                        id: "ahorro".into(),
                        title: "Ahorro".into(),
                        lessons: vec![
                            lesson(
                                "fondo-emergencia",
                                "Tu fondo de emergencia",
                                "Un colchón de tres a seis meses de gastos.",
                                10,
                                false,
                                vec![
                                    question(
                                        "q1",
                                        "¿Cuántos meses de gastos se recomienda cubrir?",
                                        &["Uno", "De tres a seis", "Veinte"],
                                        1,
                                        "De tres a seis meses cubre la mayoría de imprevistos.",
                                    ),
                                    question(
                                        "q2",
                                        "¿Dónde conviene guardar el fondo?",
                                        &["En un instrumento líquido", "En criptomonedas", "Prestado a un amigo"],
                                        0,
                                        "Debe estar disponible de inmediato y sin riesgo.",
                                    ),
                                ],
                            ),
                            lesson(
                                "interes-compuesto",
                                "Interés compuesto",
                                "Los intereses generan intereses con el tiempo.",
                                10,
                                false,
                                vec![
                                    question(
                                        "q1",
                                        "El interés compuesto se calcula sobre...",
                                        &["Solo el capital inicial", "El capital más los intereses acumulados", "La inflación"],
                                        1,
                                        "Por eso crece más rápido que el interés simple.",
                                    ),
                                    question(
                                        "q2",
                                        "¿Qué factor potencia más el interés compuesto?",
                                        &["El tiempo", "El color de la tarjeta", "La suerte"],
                                        0,
                                        "Empezar temprano multiplica el efecto.",
                                    ),
                                ],
                            ),
                        ],
                    },
                ],
            },
            Level {
                id: "inversion".into(),
                title: "Crédito e inversión".into(),
                units: vec![
                    Unit {
                        id: "credito".into(),
                        title: "Crédito inteligente".into(),
                        lessons: vec![
                            lesson(
                                "credito-101",
                                "Cómo funciona el crédito",
                                "Tasa, plazo y costo total de un préstamo.",
                                15,
                                true,
                                vec![
                                    question(
                                        "q1",
                                        "El CAT de un crédito representa...",
                                        &["El costo anual total", "El saldo de la cuenta", "Un descuento"],
                                        0,
                                        "El CAT incluye intereses y comisiones.",
                                    ),
                                    question(
                                        "q2",
                                        "Un plazo más largo normalmente implica...",
                                        &["Pagar menos en total", "Pagar más intereses en total", "No pagar intereses"],
                                        1,
                                        "Mensualidades menores, pero más intereses acumulados.",
                                    ),
                                ],
                            ),
                            lesson(
                                "tarjetas",
                                "Tarjetas de crédito",
                                "Pago mínimo, pago para no generar intereses y fechas de corte.",
                                15,
                                true,
                                vec![
                                    question(
                                        "q1",
                                        "¿Qué pago evita generar intereses?",
                                        &["El pago mínimo", "El pago para no generar intereses", "Ningún pago"],
                                        1,
                                        "Cubrirlo cada mes evita intereses ordinarios.",
                                    ),
                                    question(
                                        "q2",
                                        "La fecha de corte es...",
                                        &["El día en que cierra el periodo", "El día de tu cumpleaños", "Cuando vence la tarjeta"],
                                        0,
                                        "Las compras posteriores entran al siguiente periodo.",
                                    ),
                                ],
                            ),
                        ],
                    },
                    Unit {
                        id: "invertir".into(),
                        title: "Primeros pasos para invertir".into(),
                        lessons: vec![
                            lesson(
                                "riesgo-rendimiento",
                                "Riesgo y rendimiento",
                                "A mayor rendimiento esperado, mayor riesgo.",
                                15,
                                true,
                                vec![
                                    question(
                                        "q1",
                                        "Un instrumento con rendimiento alto suele tener...",
                                        &["Riesgo alto", "Riesgo nulo", "Garantía total"],
                                        0,
                                        "El rendimiento compensa el riesgo asumido.",
                                    ),
                                    question(
                                        "q2",
                                        "Tu horizonte de inversión es...",
                                        &["El tiempo que mantendrás la inversión", "La comisión del banco", "Un tipo de acción"],
                                        0,
                                        "Define cuánto riesgo puedes tolerar.",
                                    ),
                                ],
                            ),
                            lesson(
                                "diversificacion",
                                "Diversificación",
                                "No pongas todos los huevos en la misma canasta.",
                                15,
                                true,
                                vec![
                                    question(
                                        "q1",
                                        "Diversificar sirve para...",
                                        &["Reducir el riesgo", "Garantizar ganancias", "Evitar impuestos"],
                                        0,
                                        "Las pérdidas de un activo se compensan con otros.",
                                    ),
                                    question(
                                        "q2",
                                        "¿Cuál cartera está más diversificada?",
                                        &["Una sola acción", "Un fondo indexado", "Efectivo bajo el colchón"],
                                        1,
                                        "Un fondo indexado reparte la inversión entre muchas empresas.",
                                    ),
                                ],
                            ),
                        ],
                    },
                ],
            },
        ])
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::seed()
    }
}

fn lesson(
    id: &str,
    title: &str,
    summary: &str,
    xp_reward: u32,
    premium: bool,
    questions: Vec<QuizQuestion>,
) -> Lesson {
    Lesson {
        id: id.into(),
        title: title.into(),
        summary: summary.into(),
        xp_reward,
        premium,
        questions,
    }
}

fn question(
    id: &str,
    prompt: &str,
    options: &[&str],
    correct_option: usize,
    explanation: &str,
) -> QuizQuestion {
    QuizQuestion {
        id: id.into(),
        prompt: prompt.into(),
        options: options.iter().map(|o| (*o).to_string()).collect(),
        correct_option,
        explanation: explanation.into(),
    }
}
