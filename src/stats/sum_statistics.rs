//! Karlin-Altschul sum statistics for linked HSP sets.
//!
//! When several HSPs are chained, the chain is scored by the probability of
//! seeing that many consistently ordered segments with that total normalized
//! score. These are the sum-test primitives behind the small-gap, large-gap
//! and uneven-gap E-values used by the linking engines.
//!
//! Reference: NCBI BLAST `blast_stat.c` (s_BlastSumP, s_BlastSumPCalc,
//! s_BlastSmallGapSumE, s_BlastLargeGapSumE, s_BlastUnevenGapSumE) and
//! `ncbi_math.c` for the gamma/factorial ladder.

// ---------------------------------------------------------------------------
// Public sum-test API
// ---------------------------------------------------------------------------

/// E-value of a collection of `num_hsps` alignments under the small-gap
/// sum test, where adjacent alignments must start within `starting_points`
/// positions of each other on both sequences.
///
/// # Arguments
/// * `starting_points` - positions permitted between adjacent alignments
///   (gap size + overlap size + 1)
/// * `num_hsps` - number of distinct alignments in the collection
/// * `xsum` - sum of normalized scores (lambda * score - ln K per member)
/// * `query_length` / `subject_length` - effective lengths
/// * `searchsp_eff` - effective search space
/// * `weight_divisor` - weight from [`gap_decay_divisor`]
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/blast_stat.c (s_BlastSmallGapSumE)
pub fn small_gap_sum_e(
    starting_points: i32,
    num_hsps: i16,
    xsum: f64,
    query_length: i32,
    subject_length: i32,
    searchsp_eff: i64,
    weight_divisor: f64,
) -> f64 {
    let sum_e = if num_hsps == 1 {
        (searchsp_eff as f64) * (-xsum).exp()
    } else {
        let pair_space = (subject_length as f64) * (query_length as f64);
        let num = num_hsps as i32;

        let adjusted = xsum
            - pair_space.ln()
            - 2.0 * ((num - 1) as f64) * (starting_points as f64).ln()
            - ln_factorial(num as f64);

        p_to_e(blast_sum_p(num, adjusted)) * ((searchsp_eff as f64) / pair_space)
    };

    apply_weight_divisor(sum_e, weight_divisor)
}

/// E-value of a collection of alignments where the query-side and
/// subject-side gaps are bounded separately (exon chains over introns).
///
/// `query_start_points` / `subject_start_points` are the per-sequence
/// starting-point counts; the remaining arguments match
/// [`small_gap_sum_e`].
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/blast_stat.c (s_BlastUnevenGapSumE)
pub fn uneven_gap_sum_e(
    query_start_points: i32,
    subject_start_points: i32,
    num_hsps: i16,
    xsum: f64,
    query_length: i32,
    subject_length: i32,
    searchsp_eff: i64,
    weight_divisor: f64,
) -> f64 {
    let sum_e = if num_hsps == 1 {
        (searchsp_eff as f64) * (-xsum).exp()
    } else {
        let pair_space = (subject_length as f64) * (query_length as f64);
        let num = num_hsps as i32;

        let adjusted = xsum
            - pair_space.ln()
            - ((num - 1) as f64)
                * ((query_start_points as f64).ln() + (subject_start_points as f64).ln())
            - ln_factorial(num as f64);

        p_to_e(blast_sum_p(num, adjusted)) * ((searchsp_eff as f64) / pair_space)
    };

    apply_weight_divisor(sum_e, weight_divisor)
}

/// E-value of a collection of alignments whose relative positions are
/// unconstrained (the large-gap model).
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/blast_stat.c (s_BlastLargeGapSumE)
pub fn large_gap_sum_e(
    num_hsps: i16,
    xsum: f64,
    query_length: i32,
    subject_length: i32,
    searchsp_eff: i64,
    weight_divisor: f64,
) -> f64 {
    let sum_e = if num_hsps == 1 {
        (searchsp_eff as f64) * (-xsum).exp()
    } else {
        let pair_space = (subject_length as f64) * (query_length as f64);
        let num = num_hsps as i32;

        let adjusted = xsum - (num as f64) * pair_space.ln() + ln_factorial(num as f64);

        p_to_e(blast_sum_p(num, adjusted)) * ((searchsp_eff as f64) / pair_space)
    };

    apply_weight_divisor(sum_e, weight_divisor)
}

// NCBI: if( weight_divisor == 0.0 || (sum_e /= weight_divisor) > INT4_MAX )
//           sum_e = INT4_MAX;
fn apply_weight_divisor(sum_e: f64, weight_divisor: f64) -> f64 {
    if weight_divisor == 0.0 {
        return i32::MAX as f64;
    }
    let weighted = sum_e / weight_divisor;
    if weighted > i32::MAX as f64 {
        i32::MAX as f64
    } else {
        weighted
    }
}

/// Weight divisor applied to sum E-values when a search reports multiple
/// collections: `(1 - decay_rate) * decay_rate^(num_segments - 1)`.
/// The decay rate lies in (0,1); 0.1 and 0.5 are the stock values.
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/blast_stat.c:4081 (BLAST_GapDecayDivisor)
pub fn gap_decay_divisor(decay_rate: f64, num_segments: usize) -> f64 {
    if num_segments == 0 {
        return 1.0;
    }
    (1.0 - decay_rate) * powi(decay_rate, (num_segments - 1) as i32)
}

/// Raw score in nats: `lambda * score - ln K`.
pub fn normalize_score(raw_score: i32, lambda: f64, log_k: f64) -> f64 {
    lambda * (raw_score as f64) - log_k
}

/// P-value to E-value: `E = -ln(1 - P)`.
pub fn p_to_e(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return i32::MIN as f64;
    }
    if p == 1.0 {
        return i32::MAX as f64;
    }
    // NCBI: -BLAST_Log1p(-p)
    -log1p_taylor(-p)
}

/// E-value to P-value: `P = 1 - exp(-E)`.
pub fn e_to_p(e: f64) -> f64 {
    if e < 0.0 {
        return 0.0;
    }
    // NCBI: -BLAST_Expm1(-e)
    -expm1_taylor(-e)
}

/// Default probabilities for the even-gap model split.
pub mod defaults {
    /// Probability that a chain has small gaps (ungapped searches).
    pub const GAP_PROB_UNGAPPED: f64 = 0.5;
    /// Gapped searches trust the small-gap model entirely.
    pub const GAP_PROB_GAPPED: f64 = 1.0;
    /// Sum E-value decay rate, ungapped.
    pub const GAP_DECAY_RATE_UNGAPPED: f64 = 0.5;
    /// Sum E-value decay rate, gapped.
    pub const GAP_DECAY_RATE_GAPPED: f64 = 0.1;
}

// ---------------------------------------------------------------------------
// Sum probability
// ---------------------------------------------------------------------------

// Interpolation tables for r = 2, 3, 4. The leading entries of TAB3 are
// padding never reached by the index arithmetic; they keep NCBI's offsets.
// NCBI reference: ncbi-blast/c++/src/algo/blast/core/blast_stat.c (s_BlastSumP)
const TAB2: &[f64] = &[
    0.01669, 0.0249, 0.03683, 0.05390, 0.07794, 0.1111, 0.1559, 0.2146, 0.2890, 0.3794, 0.4836,
    0.5965, 0.7092, 0.8114, 0.8931, 0.9490, 0.9806, 0.9944, 0.9989,
];

const TAB3: &[f64] = &[
    0.9806, 0.9944, 0.9989, 0.0001682, 0.0002542, 0.0003829, 0.0005745, 0.0008587, 0.001278,
    0.001893, 0.002789, 0.004088, 0.005958, 0.008627, 0.01240, 0.01770, 0.02505, 0.03514, 0.04880,
    0.06704, 0.09103, 0.1220, 0.1612, 0.2097, 0.2682, 0.3368, 0.4145, 0.4994, 0.5881, 0.6765,
    0.7596, 0.8326, 0.8922, 0.9367, 0.9667, 0.9846, 0.9939, 0.9980,
];

const TAB4: &[f64] = &[
    2.658e-07, 4.064e-07, 6.203e-07, 9.450e-07, 1.437e-06, 2.181e-06, 3.302e-06, 4.990e-06,
    7.524e-06, 1.132e-05, 1.698e-05, 2.541e-05, 3.791e-05, 5.641e-05, 8.368e-05, 0.0001237,
    0.0001823, 0.0002677, 0.0003915, 0.0005704, 0.0008275, 0.001195, 0.001718, 0.002457, 0.003494,
    0.004942, 0.006948, 0.009702, 0.01346, 0.01853, 0.02532, 0.03431, 0.04607, 0.06128, 0.08068,
    0.1051, 0.1352, 0.1719, 0.2157, 0.2669, 0.3254, 0.3906, 0.4612, 0.5355, 0.6110, 0.6849, 0.7544,
    0.8168, 0.8699, 0.9127, 0.9451, 0.9679, 0.9827, 0.9915, 0.9963,
];

/// Probability of `r` distinct alignments reaching a combined normalized
/// score of at least `s`. Tabulated with interpolation for r <= 4,
/// numerical integration above. Accuracy is about 2.5 digits throughout.
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/blast_stat.c (s_BlastSumP)
pub fn blast_sum_p(r: i32, s: f64) -> f64 {
    if r == 1 {
        return -expm1_taylor(-(-s).exp());
    }
    if r > 4 {
        return blast_sum_p_calc(r, s);
    }
    if r < 1 {
        return 0.0;
    }

    let r1 = r - 1;
    let rf = r as f64;

    if s >= rf * rf + (r1 as f64) {
        // Appropriate when P is small
        let a = ln_gamma_int(r + 1);
        return rf * ((r1 as f64) * s.ln() - s - a - a).exp();
    }

    if s > -2.0 * rf {
        let mut a = s + s + (4.0 * rf);
        let mut i = a as i32;
        a -= i as f64;

        let table = match r - 2 {
            0 => TAB2,
            1 => TAB3,
            _ => TAB4,
        };
        i = (table.len() as i32 - 1) - i;

        // NCBI indexes blindly here; stay in range for off-contract s
        let idx = i as usize;
        if idx > 0 && idx < table.len() {
            return a * table[idx - 1] + (1.0 - a) * table[idx];
        }
    }
    1.0
}

// Sum P by double Romberg integration, used for r > 4 (and as the r <= 4
// fallback NCBI keeps for out-of-table inputs).
// NCBI reference: ncbi-blast/c++/src/algo/blast/core/blast_stat.c (s_BlastSumPCalc)
fn blast_sum_p_calc(r: i32, s: f64) -> f64 {
    const SUMP_EPSILON: f64 = 0.002;

    if r == 1 {
        if s > 8.0 {
            return (-s).exp();
        }
        return -expm1_taylor(-(-s).exp());
    }
    if r < 1 {
        return 0.0;
    }

    let rf = r as f64;

    // Whole ladder of "P is certainly 1" shortcuts
    if (r < 8 && s <= -2.3 * rf)
        || (r >= 8 && r < 15 && s <= -2.5 * rf)
        || (r >= 15 && r < 27 && s <= -3.0 * rf)
        || (r >= 27 && r < 51 && s <= -3.4 * rf)
        || (r >= 51 && r < 101 && s <= -4.0 * rf)
    {
        return 1.0;
    }

    let stddev = rf.sqrt();
    let stddev4 = 4.0 * stddev;
    let r1 = r - 1;

    if r > 100 {
        // Lower bound on the mean via log(r) <= r
        let est_mean = -rf * (r1 as f64);
        if s <= est_mean - stddev4 {
            return 1.0;
        }
    }

    let logr = rf.ln();
    let mean = rf * (1.0 - logr) - 0.5;
    if s <= mean - stddev4 {
        return 1.0;
    }

    let (t, mut itmin) = if s >= mean {
        (s + 6.0 * stddev, 1_i32)
    } else {
        (mean + 6.0 * stddev, 2_i32)
    };

    let adj1 = (r - 2) as f64 * logr - ln_gamma_int(r1) - ln_gamma_int(r);
    let inner_power = r - 2;

    let mut inner = |sum_bound: f64| -> f64 {
        let adj2 = adj1 - sum_bound;
        let shift = sum_bound / rf;
        let upper = if sum_bound > 0.0 { shift + 3.0 } else { 3.0 };
        let mut outer = |x: f64| -> f64 {
            let y = (x - shift).exp();
            if !y.is_finite() {
                return 0.0;
            }
            if inner_power == 0 {
                return (adj2 - y).exp();
            }
            if x == 0.0 {
                return 0.0;
            }
            ((inner_power as f64) * x.ln() + adj2 - y).exp()
        };
        romberg_integrate(&mut outer, 0.0, upper, SUMP_EPSILON, 0, 1)
    };

    loop {
        let p = romberg_integrate(&mut inner, s, t, SUMP_EPSILON, 0, itmin);
        if !p.is_finite() {
            return p;
        }
        if !(s < mean && p < 0.4 && itmin < 4) {
            return p.min(1.0);
        }
        itmin += 1;
    }
}

// Romberg extrapolated trapezoid rule. `itmin` iterations run regardless;
// `epsit` consecutive iterations must meet `eps` to accept.
// NCBI reference: ncbi-blast/c++/src/algo/blast/core/ncbi_math.c (BLAST_RombergIntegrate)
fn romberg_integrate<F>(f: &mut F, p: f64, q: f64, eps: f64, epsit: i32, itmin: i32) -> f64
where
    F: FnMut(f64) -> f64,
{
    const MAX_DIAGS: usize = 20;

    let itmin = itmin.clamp(1, (MAX_DIAGS - 1) as i32);
    let epsit = epsit.clamp(1, 3);
    let epsck = itmin - epsit;

    let mut romb = [0.0_f64; MAX_DIAGS];
    let mut npts: i32 = 1;
    let mut h = q - p;

    let y0 = f(p);
    if !y0.is_finite() {
        return y0;
    }
    let y1 = f(q);
    if !y1.is_finite() {
        return y1;
    }
    romb[0] = 0.5 * h * (y0 + y1);

    let mut hits: i32 = 0;
    for i in 1..MAX_DIAGS {
        // Ordinates at p + h/2, p + 3h/2, ..., q - h/2
        let mut sum = 0.0;
        let mut x = p + 0.5 * h;
        for _ in 0..npts {
            let y = f(x);
            if !y.is_finite() {
                return y;
            }
            sum += y;
            x += h;
        }
        romb[i] = 0.5 * (romb[i - 1] + h * sum);

        let mut n: f64 = 4.0;
        for j in (0..i).rev() {
            romb[j] = (n * romb[j + 1] - romb[j]) / (n - 1.0);
            n *= 4.0;
        }

        if (i as i32) > epsck {
            if (romb[1] - romb[0]).abs() > eps * romb[0].abs() {
                hits = 0;
            } else {
                hits += 1;
                if (i as i32) >= itmin && hits >= epsit {
                    return romb[0];
                }
            }
        }

        npts *= 2;
        h *= 0.5;
    }

    f64::INFINITY
}

// ---------------------------------------------------------------------------
// Gamma / factorial ladder
// ---------------------------------------------------------------------------

const LOGDERIV_ORDER_MAX: usize = 4;
const POLYGAMMA_ORDER_MAX: usize = LOGDERIV_ORDER_MAX;
const NCBIMATH_PI: f64 = 3.1415926535897932384626433832795;
const NCBIMATH_LN2: f64 = 0.69314718055994530941723212145818;
const NCBIMATH_LNPI: f64 = 1.1447298858494001741434273513531;
const DBL_EPSILON: f64 = 2.2204460492503131e-16;

// NCBI reference: ncbi-blast/c++/src/algo/blast/core/ncbi_math.c:140-151
const GAMMA_COEF: [f64; 11] = [
    4.694580336184385e+04,
    -1.560605207784446e+05,
    2.065049568014106e+05,
    -1.388934775095388e+05,
    5.031796415085709e+04,
    -9.601592329182778e+03,
    8.785855930895250e+02,
    -3.155153906098611e+01,
    2.908143421162229e-01,
    -2.319827630494973e-04,
    1.251639670050933e-10,
];

// NCBI reference: ncbi-blast/c++/src/algo/blast/core/ncbi_math.c:296-309
const FACTORIAL: [f64; 35] = [
    1.0, 1.0, 2.0, 6.0, 24.0, 120.0, 720.0, 5040.0, 40320.0, 362880.0,
    3628800.0, 39916800.0, 479001600.0, 6227020800.0, 87178291200.0,
    1307674368000.0, 20922789888000.0, 355687428096000.0,
    6402373705728000.0, 121645100408832000.0, 2432902008176640000.0,
    51090942171709440000.0, 1124000727777607680000.0,
    25852016738884976640000.0, 620448401733239439360000.0,
    15511210043330985984000000.0, 403291461126605635584000000.0,
    10888869450418352160768000000.0, 304888344611713860501504000000.0,
    8841761993739701954543616000000.0, 265252859812191058636308480000000.0,
    8222838654177922817725562880000000.0, 263130836933693530167218012160000000.0,
    8683317618811886495518194401280000000.0, 295232799039604140847618609643520000000.0,
];

/// `ln(x!)`, zero for non-positive x.
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/ncbi_math.c:473-480
pub fn ln_factorial(x: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else {
        ln_gamma(x + 1.0)
    }
}

/// `ln(Gamma(n))` for positive integer n, i.e. `ln((n-1)!)`.
///
/// NCBI reference: ncbi-blast/c++/src/algo/blast/core/ncbi_math.c:323-329
pub fn ln_gamma_int(n: i32) -> f64 {
    if n <= 0 {
        return f64::INFINITY;
    }
    if n > 1 && (n as usize) < FACTORIAL.len() {
        return FACTORIAL[(n - 1) as usize].ln();
    }
    ln_gamma(n as f64)
}

// NCBI reference: ncbi-blast/c++/src/algo/blast/core/ncbi_math.c:312-321
fn factorial(n: i32) -> f64 {
    if n < 0 {
        return 0.0;
    }
    if (n as usize) < FACTORIAL.len() {
        return FACTORIAL[n as usize];
    }
    ln_gamma(n as f64 + 1.0).exp()
}

// NCBI reference: ncbi-blast/c++/src/algo/blast/core/ncbi_math.c:292-295
fn ln_gamma(x: f64) -> f64 {
    poly_gamma(x, 0)
}

// Order-th derivative of ln(Gamma) (order 0 is ln(Gamma) itself), with
// reflection for x < 1.
// NCBI reference: ncbi-blast/c++/src/algo/blast/core/ncbi_math.c:235-284
fn poly_gamma(x: f64, order: i32) -> f64 {
    if order < 0 || order as usize > POLYGAMMA_ORDER_MAX {
        return f64::INFINITY;
    }

    if x >= 1.0 {
        return general_ln_gamma(x, order);
    }

    if x < 0.0 {
        let mut value = general_ln_gamma(1.0 - x, order);
        if (order - 1) % 2 != 0 {
            value = -value;
        }
        if order == 0 {
            let sx = (NCBIMATH_PI * x).sin().abs();
            if (x < -0.1 && (x.ceil() == x || sx < 2.0 * DBL_EPSILON)) || sx == 0.0 {
                return f64::INFINITY;
            }
            value + NCBIMATH_LNPI - sx.ln()
        } else {
            let mut y = [0.0; POLYGAMMA_ORDER_MAX + 1];
            let mut scale = 1.0;
            let mut angle = x * NCBIMATH_PI;
            y[0] = angle.sin();
            for slot in y.iter_mut().take(order as usize + 1).skip(1) {
                scale *= NCBIMATH_PI;
                angle += NCBIMATH_PI / 2.0;
                *slot = scale * angle.sin();
            }
            value - log_derivative(order, &y)
        }
    } else {
        let value = general_ln_gamma(1.0 + x, order);
        if order == 0 {
            if x == 0.0 {
                return f64::INFINITY;
            }
            value - x.ln()
        } else {
            let tmp = factorial(order - 1) * powi(x, -order);
            if order % 2 == 0 {
                value + tmp
            } else {
                value - tmp
            }
        }
    }
}

// Series evaluation valid for x >= 1.
// NCBI reference: ncbi-blast/c++/src/algo/blast/core/ncbi_math.c:161-221
fn general_ln_gamma(x: f64, order: i32) -> f64 {
    let xx = x - 1.0;
    let dim = GAMMA_COEF.len() as f64;
    let tx = xx + dim;
    let mut y = [0.0; POLYGAMMA_ORDER_MAX + 1];

    for i in 0..=order {
        let mut tmp = tx;
        let mut idx = GAMMA_COEF.len() - 1;
        let mut value;
        if i == 0 {
            value = GAMMA_COEF[idx] / tmp;
            while idx > 0 {
                idx -= 1;
                tmp -= 1.0;
                value += GAMMA_COEF[idx] / tmp;
            }
        } else {
            value = GAMMA_COEF[idx] / powi(tmp, i + 1);
            while idx > 0 {
                idx -= 1;
                tmp -= 1.0;
                value += GAMMA_COEF[idx] / powi(tmp, i + 1);
            }
            let fact = factorial(i);
            value *= if i % 2 == 0 { fact } else { -fact };
        }
        y[i as usize] = value;
    }
    y[0] += 1.0;

    let mut value = log_derivative(order, &y);
    let mut tmp = tx + 0.5;
    match order {
        0 => value += (NCBIMATH_LNPI + NCBIMATH_LN2) / 2.0 + (xx + 0.5) * tmp.ln() - tmp,
        1 => value += tmp.ln() - dim / tmp,
        2 => value += (tmp + dim) / (tmp * tmp),
        3 => value -= (1.0 + 2.0 * dim / tmp) / (tmp * tmp),
        4 => value += 2.0 * (1.0 + 3.0 * dim / tmp) / (tmp * tmp * tmp),
        _ => {
            tmp = factorial(order - 2)
                * powi(tmp, 1 - order)
                * (1.0 + (order as f64 - 1.0) * dim / tmp);
            if order % 2 == 0 {
                value += tmp;
            } else {
                value -= tmp;
            }
        }
    }
    value
}

// Order-th derivative of ln(u[0]) given derivatives of u.
// NCBI reference: ncbi-blast/c++/src/algo/blast/core/ncbi_math.c:94-137
fn log_derivative(order: i32, u: &[f64]) -> f64 {
    if order < 0 || order as usize > LOGDERIV_ORDER_MAX {
        return f64::INFINITY;
    }
    if order > 0 && u[0] == 0.0 {
        return f64::INFINITY;
    }

    let mut y = [0.0; LOGDERIV_ORDER_MAX + 1];
    for i in 1..=order as usize {
        y[i] = u[i] / u[0];
    }

    match order {
        0 => {
            if u[0] > 0.0 {
                u[0].ln()
            } else {
                f64::INFINITY
            }
        }
        1 => y[1],
        2 => y[2] - y[1] * y[1],
        3 => y[3] - 3.0 * y[2] * y[1] + 2.0 * y[1] * y[1] * y[1],
        4 => {
            let sq = y[1] * y[1];
            y[4] - 4.0 * y[3] * y[1] - 3.0 * y[2] * y[2] + 12.0 * y[2] * sq - 6.0 * sq * sq
        }
        _ => f64::INFINITY,
    }
}

// ---------------------------------------------------------------------------
// Elementary pieces
// ---------------------------------------------------------------------------

// exp(x) - 1, series form near zero.
// NCBI reference: ncbi-blast/c++/src/algo/blast/core/ncbi_math.c:33-55
fn expm1_taylor(x: f64) -> f64 {
    let absx = x.abs();
    if absx > 0.33 {
        return x.exp() - 1.0;
    }
    if absx < 1.0e-16 {
        return x;
    }
    x * (1.0
        + x * (1.0 / 2.0
            + x * (1.0 / 6.0
                + x * (1.0 / 24.0
                    + x * (1.0 / 120.0
                        + x * (1.0 / 720.0
                            + x * (1.0 / 5040.0
                                + x * (1.0 / 40320.0
                                    + x * (1.0 / 362880.0
                                        + x * (1.0 / 3628800.0
                                            + x * (1.0 / 39916800.0
                                                + x * (1.0 / 479001600.0
                                                    + x / 6227020800.0))))))))))))
}

// ln(1 + x), alternating series for |x| < 0.2.
// NCBI reference: ncbi-blast/c++/src/algo/blast/core/ncbi_math.c:64-83
fn log1p_taylor(x: f64) -> f64 {
    if x.abs() >= 0.2 {
        return (x + 1.0).ln();
    }
    let mut sum = 0.0;
    let mut y = x;
    let mut i = 0;
    while i < 500 {
        i += 1;
        sum += y / (i as f64);
        if y.abs() < DBL_EPSILON {
            break;
        }
        y *= x;
        i += 1;
        sum -= y / (i as f64);
        if y < DBL_EPSILON {
            break;
        }
        y *= x;
    }
    sum
}

// Integer power by squaring.
// NCBI reference: ncbi-blast/c++/src/algo/blast/core/ncbi_math.c:444-470
fn powi(mut x: f64, mut n: i32) -> f64 {
    if n == 0 {
        return 1.0;
    }
    if x == 0.0 {
        return if n < 0 { f64::INFINITY } else { 0.0 };
    }
    if n < 0 {
        x = 1.0 / x;
        n = -n;
    }
    let mut y = 1.0;
    while n > 0 {
        if (n & 1) != 0 {
            y *= x;
        }
        n /= 2;
        x *= x;
    }
    y
}
