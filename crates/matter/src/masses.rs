/// standard atomic weights in amu, indexed by atomic number. index 0 is a
/// placeholder
pub const MASSES: [f64; 87] = [
    0.0,
    1.008,        // H
    4.002602,     // He
    6.94,         // Li
    9.0121831,    // Be
    10.81,        // B
    12.011,       // C
    14.007,       // N
    15.999,       // O
    18.998403163, // F
    20.1797,      // Ne
    22.98976928,  // Na
    24.305,       // Mg
    26.9815385,   // Al
    28.085,       // Si
    30.973761998, // P
    32.06,        // S
    35.45,        // Cl
    39.948,       // Ar
    39.0983,      // K
    40.078,       // Ca
    44.955908,    // Sc
    47.867,       // Ti
    50.9415,      // V
    51.9961,      // Cr
    54.938044,    // Mn
    55.845,       // Fe
    58.933194,    // Co
    58.6934,      // Ni
    63.546,       // Cu
    65.38,        // Zn
    69.723,       // Ga
    72.630,       // Ge
    74.921595,    // As
    78.971,       // Se
    79.904,       // Br
    83.798,       // Kr
    85.4678,      // Rb
    87.62,        // Sr
    88.90584,     // Y
    91.224,       // Zr
    92.90637,     // Nb
    95.95,        // Mo
    98.0,         // Tc
    101.07,       // Ru
    102.90550,    // Rh
    106.42,       // Pd
    107.8682,     // Ag
    112.414,      // Cd
    114.818,      // In
    118.710,      // Sn
    121.760,      // Sb
    127.60,       // Te
    126.90447,    // I
    131.293,      // Xe
    132.90545196, // Cs
    137.327,      // Ba
    138.90547,    // La
    140.116,      // Ce
    140.90766,    // Pr
    144.242,      // Nd
    145.0,        // Pm
    150.36,       // Sm
    151.964,      // Eu
    157.25,       // Gd
    158.92535,    // Tb
    162.500,      // Dy
    164.93033,    // Ho
    167.259,      // Er
    168.93422,    // Tm
    173.045,      // Yb
    174.9668,     // Lu
    178.49,       // Hf
    180.94788,    // Ta
    183.84,       // W
    186.207,      // Re
    190.23,       // Os
    192.217,      // Ir
    195.084,      // Pt
    196.966569,   // Au
    200.592,      // Hg
    204.38,       // Tl
    207.2,        // Pb
    208.98040,    // Bi
    209.0,        // Po
    210.0,        // At
    222.0,        // Rn
];
