//! Static report corpora used across harnesses.
//!
//! Each corpus is a verbatim capture excerpt, including the noise lines a
//! real capture carries (banners, stray daemon chatter). Tests assert on
//! hand-computed values from these corpora, so edit with care.

/// Three chrony tracking blocks, 10 s apart. Block 2 is missing
/// `Last offset`; block 3 carries no metric at all and must be dropped.
pub const TRACKING_LOW: &str = "\
===== SAMPLE 1/3 @ 2026-02-04T09:42:27+00:00 =====
Reference ID    : C0A80001 (servergm)
Stratum         : 2
System time     : 0.002000000 seconds slow of NTP time
Last offset     : -0.000424827 seconds
RMS offset      : 0.000512000 seconds
===== SAMPLE 2/3 @ 2026-02-04T09:42:37+00:00 =====
System time     : 0.001500000 seconds fast of NTP time
===== SAMPLE 3/3 @ 2026-02-04T09:42:47+00:00 =====
Stratum         : 2
";

/// A high-degradation tracking capture with a larger offset, for shared
/// scale tests.
pub const TRACKING_HIGH: &str = "\
===== SAMPLE 1/1 @ 2026-02-04T10:00:00+00:00 =====
System time     : 0.014000000 seconds fast of NTP time
Last offset     : 0.009000000 seconds
";

/// Sourcestats tables paired with [`TRACKING_LOW`]. Offset/std-dev cells
/// exercise all four unit suffixes plus the bare-number (seconds) form.
pub const SOURCESTATS_LOW: &str = "\
===== SAMPLE 1/2 @ 2026-02-04T09:42:27+00:00 =====
Name/IP Address            NP  NR  Span  Frequency  Freq Skew  Offset  Std Dev
==============================================================================
servergm                    7   5    45     -5.006      9.671   -11us    73us
backupgm                    4   3    30     -1.200      4.400  -328ns     2ms
===== SAMPLE 2/2 @ 2026-02-04T09:42:37+00:00 =====
Name/IP Address            NP  NR  Span  Frequency  Freq Skew  Offset  Std Dev
==============================================================================
servergm                    8   6    52     -4.920      8.112  0.001s    61us
";

pub const SOURCESTATS_HIGH: &str = "\
===== SAMPLE 1/1 @ 2026-02-04T10:00:00+00:00 =====
Name/IP Address            NP  NR  Span  Frequency  Freq Skew  Offset  Std Dev
==============================================================================
servergm                    6   4    40     -7.100     12.400  +4200us   900us
";

/// Three ntpq snapshots: initialization, then lock onto `serverntp`. The
/// `18:invalid` line is capture noise and must be soft-skipped.
pub const NTPQ_CLIENT_LOW: &str = "\
--- 10:00:00 ---
     remote           refid      st t when poll reach   delay   offset   jitter
===============================================================================
 serverntp       .INIT.         16 u    -   64    0   0.0000   0.0000   0.0001
--- 10:00:10 ---
     remote           refid      st t when poll reach   delay   offset   jitter
===============================================================================
*serverntp       .GPS.           1 u   39   64  376   6.7970  -2.7943   0.6513
 backup          10.0.0.9        2 u   12   64  377   9.0000   5.0000   1.0000
18:invalid
--- 10:00:20 ---
     remote           refid      st t when poll reach   delay   offset   jitter
===============================================================================
*serverntp       .GPS.           1 u   49   64  377   6.9000  -1.2057   0.4487
";

/// Boundary-clock ptp4l log: startup transitions, an s0 sample before the
/// servo locks, two s2 samples, then a fault transition.
pub const PTP_BOUNDARY_LOW: &str = "\
ptp4l[1000.000]: port 1: LISTENING to UNCALIBRATED on RS_SLAVE
ptp4l[1001.500]: selected best master clock 001122.fffe.334455
ptp4l[1002.000]: port 1: UNCALIBRATED to SLAVE on MASTER_CLOCK_SELECTED
ptp4l[1003.000]: master offset        -1452 s0 freq   -3491 path delay      9573
ptp4l[1004.000]: master offset         -328 s2 freq   -3201 path delay      9581
ptp4l[1005.000]: master offset          112 s2 freq   -3188 path delay      9579
systemd[1]: some unrelated daemon chatter
ptp4l[1006.000]: port 1: SLAVE to FAULTY on FAULT_DETECTED (FT_UNSPECIFIED)
";

/// Client ptp4l log: one pre-lock summary row, lock, then post-lock rows
/// with and without the optional delay tail.
pub const PTP_CLIENT_LOW: &str = "\
ptp4l[500.000]: port 1: LISTENING to UNCALIBRATED on RS_SLAVE
ptp4l[501.000]: rms 9412 max 20310 freq  -1420 +/-  800
ptp4l[502.000]: port 1: UNCALIBRATED to SLAVE on MASTER_CLOCK_SELECTED
ptp4l[503.000]: rms  842 max 1733 freq  -1200 +/-  312 delay  9120 +/-   44
ptp4l[504.000]: rms  610 max 1210 freq  -1180 +/-  250
ptp4l[505.000]: selected best master clock 001122.fffe.334455
";
